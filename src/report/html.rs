//! Printable HTML: one `<section>` per page, each holding an inline SVG
//! sized to the physical page

use crate::render::surface::{Anchor, DrawOp, Image, Point, MM_PER_PT};
use crate::report::ReportDocument;
use crate::severity::Rgb;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::{self, Write};

pub fn write<W: Write>(writer: &mut W, doc: &ReportDocument) -> io::Result<()> {
    let size = doc.page_size();
    let (w, h) = (size.width, size.height);

    write!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        @page {{ size: {w}mm {h}mm; margin: 0; }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            background: #e9ecef;
            font-family: Helvetica, Arial, sans-serif;
        }}
        section.page {{
            width: {w}mm;
            height: {h}mm;
            margin: 8mm auto;
            background: #ffffff;
            box-shadow: 0 1px 4px rgba(0, 0, 0, 0.25);
            overflow: hidden;
            break-after: page;
            page-break-after: always;
        }}
        section.page:last-child {{ break-after: auto; page-break-after: auto; }}
        svg {{ display: block; }}
        @media print {{
            body {{ background: none; }}
            section.page {{ margin: 0; box-shadow: none; }}
        }}
    </style>
</head>
<body>
"#,
        title = xml_escape(&format!("{} - Vibration Report", doc.title())),
        w = w,
        h = h,
    )?;

    for page in doc.pages() {
        writeln!(
            writer,
            r#"<section class="page" id="page-{n}">
<svg xmlns="http://www.w3.org/2000/svg" width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}" font-family="Helvetica, Arial, sans-serif">"#,
            n = page.index() + 1,
            w = w,
            h = h,
        )?;
        for op in page.ops() {
            write_op(writer, op)?;
        }
        writeln!(writer, "</svg>\n</section>")?;
    }

    writeln!(writer, "</body>\n</html>")?;
    Ok(())
}

fn write_op<W: Write>(writer: &mut W, op: &DrawOp) -> io::Result<()> {
    match op {
        DrawOp::Rect { x, y, width, height, fill, stroke, radius } => {
            let fill = fill.map(Rgb::to_hex).unwrap_or_else(|| "none".to_string());
            let (stroke_color, stroke_width) = match stroke {
                Some(s) => (s.color.to_hex(), s.width),
                None => ("none".to_string(), 0.0),
            };
            writeln!(
                writer,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" fill="{}" stroke="{}" stroke-width="{:.2}"/>"#,
                x, y, width, height, radius, fill, stroke_color, stroke_width
            )
        }
        DrawOp::Line { from, to, stroke } => writeln!(
            writer,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.2}"/>"#,
            from.x, from.y, to.x, to.y, stroke.color, stroke.width
        ),
        DrawOp::Polyline { points, stroke } => writeln!(
            writer,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{:.2}" stroke-linejoin="round"/>"#,
            points_attr(points),
            stroke.color,
            stroke.width
        ),
        DrawOp::Polygon { points, fill, opacity } => writeln!(
            writer,
            r#"<polygon points="{}" fill="{}" fill-opacity="{:.2}"/>"#,
            points_attr(points),
            fill,
            opacity
        ),
        DrawOp::Text { at, text, style } => {
            let anchor = match style.anchor {
                Anchor::Start => "start",
                Anchor::Middle => "middle",
                Anchor::End => "end",
            };
            let weight = if style.bold { "bold" } else { "normal" };
            let transform = if style.rotate != 0.0 {
                format!(r#" transform="rotate({:.1} {:.2} {:.2})""#, style.rotate, at.x, at.y)
            } else {
                String::new()
            };
            writeln!(
                writer,
                r#"<text x="{:.2}" y="{:.2}" font-size="{:.2}" fill="{}" text-anchor="{}" font-weight="{}"{}>{}</text>"#,
                at.x,
                at.y,
                style.size * MM_PER_PT,
                style.color,
                anchor,
                weight,
                transform,
                xml_escape(text)
            )
        }
        DrawOp::Image { x, y, width, height, image } => writeln!(
            writer,
            r#"<image x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" preserveAspectRatio="xMinYMid meet" href="{}"/>"#,
            x,
            y,
            width,
            height,
            data_uri(image)
        ),
    }
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn data_uri(image: &Image) -> String {
    format!("data:{};base64,{}", image.mime, STANDARD.encode(&image.bytes))
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
