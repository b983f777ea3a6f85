//! HTTP delivery of reports
//!
//! `vibereport serve ./machines` → serves every machine record in the
//! directory. Reports are rendered on request and returned as downloads.
//!
//! | Route | Response |
//! |--------------------------------|------------------------------------|
//! | `GET /` | index page linking every report |
//! | `GET /api/machines` | machine list as JSON |
//! | `GET /report/<id>?bearing=<b>` | HTML report as an attachment |

use crate::layout::LayoutMetrics;
use crate::model::MachineRecord;
use crate::render::surface::Image;
use crate::report::{self, html, Mode};
use crate::severity::classify_opt;
use crate::synthetic::RandomSynthesizer;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct MachineSummary {
    pub id: String,
    pub name: String,
    pub status: String,
    pub bearings: Vec<String>,
}

#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct ReportParams {
    #[serde(default)]
    pub bearing: Option<String>,
}

/// Everything a request handler needs besides the request
pub struct ServeContext {
    pub dir: PathBuf,
    pub metrics: LayoutMetrics,
    pub logo: Option<Arc<Image>>,
}

/// Start server, open browser, serve reports until the process ends
pub fn start(port: u16, context: ServeContext) -> io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);
    eprintln!("\n\x1b[1;32mvibereport\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Serving: {}\n", context.dir.display());
    info!(%addr, dir = %context.dir.display(), "report server listening");

    let _ = open::that(&url);

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &context) {
            error!(error = %e, "request failed");
        }
    }

    Ok(())
}

/// A routed response before it is written to the connection
struct Reply {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    disposition: Option<String>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self { status, content_type, body: body.into(), disposition: None }
    }
}

fn handle_request(request: Request, context: &ServeContext) -> io::Result<()> {
    let reply = route(request.method(), request.url(), context)?;
    respond(request, reply)
}

fn route(method: &Method, url: &str, context: &ServeContext) -> io::Result<Reply> {
    let mut parts = url.splitn(2, '?');
    let path = parts.next().unwrap_or("/");
    let query = parts.next().unwrap_or("");

    match (method, path) {
        (&Method::Get, "/") => {
            let machines = load_machines(&context.dir);
            Ok(Reply::new(200, "text/html; charset=utf-8", index_html(&machines)))
        }

        (&Method::Get, "/api/machines") => {
            let summaries: Vec<MachineSummary> = load_machines(&context.dir)
                .iter()
                .map(|(_, m)| summarize(m))
                .collect();
            let json = serde_json::to_string(&ApiResponse::success(summaries))?;
            Ok(Reply::new(200, "application/json", json))
        }

        (&Method::Get, p) if p.starts_with("/report/") => {
            let Ok(id) = urlencoding::decode(&p["/report/".len()..]) else {
                return Ok(Reply::new(400, "text/plain", "Malformed machine id"));
            };
            let params: ReportParams = serde_urlencoded::from_str(query).unwrap_or_default();
            let machines = load_machines(&context.dir);
            let Some((_, machine)) = machines.iter().find(|(_, m)| m.id() == Some(id.as_ref())) else {
                return Ok(Reply::new(404, "text/plain", format!("Unknown machine {}", id)));
            };

            let mode = match params.bearing {
                Some(b) if !b.is_empty() => Mode::SingleBearing(b),
                _ => Mode::AllBearings,
            };
            let mut synth = RandomSynthesizer::new();
            let today = chrono::Local::now().date_naive();
            let rendered = report::assemble(machine, mode, &context.metrics, context.logo.clone(), &mut synth, today)
                .and_then(|doc| {
                    let mut body = Vec::new();
                    html::write(&mut body, &doc)?;
                    Ok((doc.file_name().to_string(), body))
                });

            match rendered {
                Ok((file_name, body)) => {
                    info!(machine = %id, file = %file_name, "report served");
                    let mut reply = Reply::new(200, "text/html; charset=utf-8", body);
                    reply.disposition = Some(format!("attachment; filename=\"{}\"", file_name));
                    Ok(reply)
                }
                Err(e) => {
                    error!(machine = %id, error = %e, "report generation failed");
                    Ok(Reply::new(500, "text/plain", "Report generation failed"))
                }
            }
        }

        // 404
        _ => Ok(Reply::new(404, "text/plain", "Not found")),
    }
}

fn header(name: &str, value: &str) -> io::Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid header {}", name)))
}

fn respond(request: Request, reply: Reply) -> io::Result<()> {
    let mut response = Response::from_data(reply.body)
        .with_status_code(reply.status)
        .with_header(header("Content-Type", reply.content_type)?);
    if let Some(disposition) = reply.disposition {
        response = response.with_header(header("Content-Disposition", &disposition)?);
    }
    request.respond(response)
}

/// Every parseable machine record under `dir`
pub fn load_machines(dir: &Path) -> Vec<(PathBuf, MachineRecord)> {
    let mut machines: Vec<(PathBuf, MachineRecord)> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .filter_map(|e| {
            let path = e.path().to_path_buf();
            let parsed = std::fs::read_to_string(&path)
                .map_err(crate::error::ReportError::from)
                .and_then(|text| MachineRecord::from_json(&text));
            match parsed {
                Ok(machine) => Some((path, machine)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable machine record");
                    None
                }
            }
        })
        .collect();
    machines.sort_by(|a, b| a.0.cmp(&b.0));
    machines
}

fn summarize(machine: &MachineRecord) -> MachineSummary {
    MachineSummary {
        id: machine.id().unwrap_or(crate::model::NOT_AVAILABLE).to_string(),
        name: machine.title().to_string(),
        status: classify_opt(machine.status_label()).name().to_string(),
        bearings: machine.bearings.iter().map(|b| b.id().to_string()).collect(),
    }
}

fn index_html(machines: &[(PathBuf, MachineRecord)]) -> String {
    let rows: Vec<String> = machines
        .iter()
        .map(|(_, m)| {
            let s = summarize(m);
            let bearings: Vec<String> = s
                .bearings
                .iter()
                .map(|b| format!(r#"<a href="{}">{}</a>"#, escape(&report_link(&s.id, Some(b))), escape(b)))
                .collect();
            format!(
                r#"<tr><td><a href="{href}">{name}</a></td><td>{status}</td><td>{bearings}</td></tr>"#,
                href = escape(&report_link(&s.id, None)),
                name = escape(&s.name),
                status = s.status,
                bearings = bearings.join(" ")
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Vibration Reports</title>
<style>body {{ font-family: Helvetica, Arial, sans-serif; margin: 2rem; }} td, th {{ padding: 0.3rem 0.8rem; text-align: left; }}</style>
</head>
<body>
<h1>Vibration Reports</h1>
<table><tr><th>Machine</th><th>Status</th><th>Bearings</th></tr>
{}
</table>
</body>
</html>"#,
        rows.join("\n")
    )
}

/// Download path for a machine report, optionally scoped to one bearing
fn report_link(machine_id: &str, bearing: Option<&str>) -> String {
    match bearing {
        Some(b) => format!("/report/{}?bearing={}", urlencoding::encode(machine_id), urlencoding::encode(b)),
        None => format!("/report/{}", urlencoding::encode(machine_id)),
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_machines_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"machineId": "M1", "bearings": [{"_id": "B1"}]}"#).unwrap();
        fs::write(dir.path().join("b.json"), "{broken").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let machines = load_machines(dir.path());
        assert_eq!(machines.len(), 1);
        assert_eq!(machines[0].1.id(), Some("M1"));
    }

    #[test]
    fn test_summary() {
        let m = MachineRecord::from_json(r#"{"machineId": "M1", "name": "Fan", "status": "ALERT", "bearings": [{"_id": "B1"}]}"#)
            .unwrap();
        assert_eq!(
            summarize(&m),
            MachineSummary {
                id: "M1".into(),
                name: "Fan".into(),
                status: "Alert".into(),
                bearings: vec!["B1".into()],
            }
        );
    }

    #[test]
    fn test_report_params() {
        let p: ReportParams = serde_urlencoded::from_str("bearing=B%201").unwrap();
        assert_eq!(p.bearing.as_deref(), Some("B 1"));
        let p: ReportParams = serde_urlencoded::from_str("").unwrap();
        assert_eq!(p.bearing, None);
    }

    #[test]
    fn test_index_links_reports() {
        let m = MachineRecord::from_json(r#"{"machineId": "M1", "name": "<Fan>", "bearings": [{"_id": "B1"}]}"#).unwrap();
        let html = index_html(&[(PathBuf::from("a.json"), m)]);
        assert!(html.contains(r#"href="/report/M1""#));
        assert!(html.contains(r#"href="/report/M1?bearing=B1""#));
        assert!(html.contains("&lt;Fan&gt;"));
    }

    // ==========================================================================
    // ROUTING TESTS
    // ==========================================================================

    fn context_with(record: &str) -> (tempfile::TempDir, ServeContext) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("machine.json"), record).unwrap();
        let context = ServeContext { dir: dir.path().to_path_buf(), metrics: LayoutMetrics::default(), logo: None };
        (dir, context)
    }

    #[test]
    fn test_report_for_id_that_needs_encoding() {
        let (_dir, context) = context_with(r#"{"machineId": "Pump 01", "bearings": [{"_id": "B&1"}, {"_id": "B2"}]}"#);

        let reply = route(&Method::Get, "/report/Pump%2001", &context).unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.disposition.unwrap().contains("Report_Pump_01_all_bearings_"));

        let reply = route(&Method::Get, "/report/Pump%2001?bearing=B%261", &context).unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.disposition.unwrap().contains("_B_1_"));
    }

    #[test]
    fn test_index_links_are_encoded() {
        let (_dir, context) = context_with(r#"{"machineId": "Pump \"01\"", "bearings": [{"_id": "B&1"}]}"#);
        let reply = route(&Method::Get, "/", &context).unwrap();
        let html = String::from_utf8(reply.body).unwrap();
        assert!(html.contains(r#"href="/report/Pump%20%2201%22""#));
        assert!(html.contains(r#"href="/report/Pump%20%2201%22?bearing=B%261""#));
    }

    #[test]
    fn test_unknown_routes_and_machines() {
        let (_dir, context) = context_with(r#"{"machineId": "M1"}"#);
        assert_eq!(route(&Method::Get, "/report/M2", &context).unwrap().status, 404);
        assert_eq!(route(&Method::Get, "/report/%FF", &context).unwrap().status, 400);
        assert_eq!(route(&Method::Post, "/api/machines", &context).unwrap().status, 404);
        assert_eq!(route(&Method::Get, "/api/machines", &context).unwrap().status, 200);
    }
}
