use chrono::Utc;
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Polygon,
    Rgb,
};

use super::domain::IncidentView;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;

/// Error raised while rendering an incident report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report rendering failed: {0}")]
    Render(String),
}

fn brand_red() -> Color {
    Color::Rgb(Rgb::new(0.86, 0.15, 0.15, None))
}

fn slate_dark() -> Color {
    Color::Rgb(Rgb::new(0.12, 0.16, 0.23, None))
}

fn slate_mid() -> Color {
    Color::Rgb(Rgb::new(0.39, 0.45, 0.55, None))
}

fn slate_light() -> Color {
    Color::Rgb(Rgb::new(0.95, 0.96, 0.98, None))
}

fn white() -> Color {
    Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None))
}

fn filled_rect(layer: &PdfLayerReference, x: f32, y: f32, width: f32, height: f32, fill: Color) {
    layer.set_fill_color(fill);
    let rect = Polygon {
        rings: vec![vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + width), Mm(y)), false),
            (Point::new(Mm(x + width), Mm(y + height)), false),
            (Point::new(Mm(x), Mm(y + height)), false),
        ]],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    };
    layer.add_polygon(rect);
}

fn divider(layer: &PdfLayerReference, y: f32) {
    layer.set_outline_color(slate_mid());
    layer.set_outline_thickness(0.3);
    let line = Line {
        points: vec![
            (Point::new(Mm(MARGIN_MM), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), Mm(y)), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn section_heading(layer: &PdfLayerReference, fonts: &Fonts, title: &str, y: &mut f32) {
    layer.set_fill_color(slate_dark());
    layer.use_text(title, 14.0, Mm(MARGIN_MM), Mm(*y), &fonts.bold);
    *y -= 2.5;
    divider(layer, *y);
    *y -= 7.0;
}

fn field(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    label: &str,
    value: &str,
    x: f32,
    y: f32,
) {
    layer.set_fill_color(slate_mid());
    layer.use_text(label, 8.5, Mm(x), Mm(y), &fonts.regular);
    layer.set_fill_color(slate_dark());
    layer.use_text(value, 10.5, Mm(x), Mm(y - 5.0), &fonts.bold);
}

/// Render the fixed-section incident report: header, case overview, location,
/// timeline table, responder roster, footer.
pub fn render_incident_report(view: &IncidentView) -> Result<Vec<u8>, ReportError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Report-{}", view.id),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "report",
    );
    let layer = doc.get_page(page).get_layer(layer);
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|err| ReportError::Render(err.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|err| ReportError::Render(err.to_string()))?,
    };

    // Header band with branding.
    filled_rect(&layer, 0.0, PAGE_HEIGHT_MM - 42.0, PAGE_WIDTH_MM, 42.0, slate_dark());
    layer.set_fill_color(white());
    layer.use_text("LifeLine", 24.0, Mm(MARGIN_MM), Mm(PAGE_HEIGHT_MM - 20.0), &fonts.bold);
    layer.set_fill_color(brand_red());
    layer.use_text(
        "Live Emergency Response Network",
        10.0,
        Mm(MARGIN_MM),
        Mm(PAGE_HEIGHT_MM - 28.0),
        &fonts.regular,
    );
    layer.set_fill_color(white());
    layer.use_text(
        "EMERGENCY INCIDENT REPORT",
        13.0,
        Mm(104.0),
        Mm(PAGE_HEIGHT_MM - 20.0),
        &fonts.bold,
    );
    layer.set_fill_color(slate_mid());
    layer.use_text(
        format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M UTC")),
        8.5,
        Mm(104.0),
        Mm(PAGE_HEIGHT_MM - 28.0),
        &fonts.regular,
    );

    let mut y = PAGE_HEIGHT_MM - 56.0;

    // Status badge.
    let badge_color = match view.status.label() {
        "resolved" => Color::Rgb(Rgb::new(0.06, 0.73, 0.51, None)),
        _ => brand_red(),
    };
    filled_rect(&layer, 158.0, y - 1.5, 34.0, 7.5, badge_color);
    layer.set_fill_color(white());
    layer.use_text(
        view.status.label().to_uppercase(),
        9.0,
        Mm(162.0),
        Mm(y),
        &fonts.bold,
    );

    section_heading(&layer, &fonts, "Case Overview", &mut y);

    let patient = view
        .reporter
        .as_ref()
        .map(|reporter| reporter.name.as_str())
        .unwrap_or("Unknown");
    let contact = view
        .reporter
        .as_ref()
        .map(|reporter| reporter.phone.as_str())
        .or(view.contact_number.as_deref())
        .unwrap_or("N/A");
    let blood_and_priority = format!(
        "{} (Score: {})",
        view.blood_group.map(|group| group.label()).unwrap_or("N/A"),
        view.priority_score
    );

    let col2 = 110.0;
    field(&layer, &fonts, "Case ID", &view.id.0, MARGIN_MM, y);
    field(&layer, &fonts, "Incident Type", &view.kind.label().to_uppercase(), col2, y);
    y -= 13.0;
    field(&layer, &fonts, "Patient Name", patient, MARGIN_MM, y);
    field(&layer, &fonts, "Contact Number", contact, col2, y);
    y -= 13.0;
    field(
        &layer,
        &fonts,
        "Reported Time",
        &view.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        MARGIN_MM,
        y,
    );
    field(&layer, &fonts, "Blood Group / Priority", &blood_and_priority, col2, y);
    y -= 16.0;

    section_heading(&layer, &fonts, "Location Details", &mut y);
    layer.set_fill_color(slate_dark());
    layer.use_text(
        format!(
            "Coordinates: {:.6}, {:.6}",
            view.location.latitude, view.location.longitude
        ),
        10.0,
        Mm(MARGIN_MM),
        Mm(y),
        &fonts.regular,
    );
    y -= 5.5;
    layer.set_fill_color(slate_mid());
    layer.use_text(
        format!(
            "https://www.google.com/maps?q={},{}",
            view.location.latitude, view.location.longitude
        ),
        8.5,
        Mm(MARGIN_MM),
        Mm(y),
        &fonts.regular,
    );
    y -= 12.0;

    section_heading(&layer, &fonts, "Incident Timeline", &mut y);

    // Table header row.
    filled_rect(&layer, MARGIN_MM, y - 2.0, PAGE_WIDTH_MM - 2.0 * MARGIN_MM, 7.5, slate_light());
    layer.set_fill_color(slate_dark());
    layer.use_text("Time", 9.0, Mm(MARGIN_MM + 3.0), Mm(y), &fonts.bold);
    layer.use_text("Status", 9.0, Mm(70.0), Mm(y), &fonts.bold);
    layer.use_text("Details", 9.0, Mm(110.0), Mm(y), &fonts.bold);
    y -= 8.5;

    for (index, entry) in view.timeline.iter().enumerate() {
        if y < 48.0 {
            layer.set_fill_color(slate_mid());
            layer.use_text("(timeline truncated)", 8.5, Mm(MARGIN_MM + 3.0), Mm(y), &fonts.regular);
            y -= 8.0;
            break;
        }

        // Alternating row tint, cosmetic only.
        if index % 2 == 1 {
            filled_rect(&layer, MARGIN_MM, y - 2.0, PAGE_WIDTH_MM - 2.0 * MARGIN_MM, 7.0, slate_light());
        }

        layer.set_fill_color(slate_dark());
        layer.use_text(
            entry.timestamp.format("%H:%M:%S").to_string(),
            9.0,
            Mm(MARGIN_MM + 3.0),
            Mm(y),
            &fonts.regular,
        );
        let status_color = match entry.status.as_str() {
            "created" => brand_red(),
            "resolved" => Color::Rgb(Rgb::new(0.06, 0.73, 0.51, None)),
            _ => slate_dark(),
        };
        layer.set_fill_color(status_color);
        layer.use_text(entry.status.to_uppercase(), 9.0, Mm(70.0), Mm(y), &fonts.regular);
        layer.set_fill_color(slate_dark());
        layer.use_text(
            entry.details.as_deref().unwrap_or("-"),
            9.0,
            Mm(110.0),
            Mm(y),
            &fonts.regular,
        );
        y -= 7.5;
    }
    y -= 6.0;

    if !view.responders.is_empty() && y > 52.0 {
        section_heading(&layer, &fonts, "Response Team", &mut y);
        for entry in &view.responders {
            if y < 48.0 {
                break;
            }
            layer.set_fill_color(brand_red());
            layer.use_text(
                entry.name.as_deref().unwrap_or("Unknown responder"),
                10.0,
                Mm(MARGIN_MM + 3.0),
                Mm(y),
                &fonts.bold,
            );
            layer.set_fill_color(slate_mid());
            layer.use_text(
                format!(
                    "Role: {}",
                    entry.role.map(|role| role.label()).unwrap_or("n/a")
                ),
                8.5,
                Mm(110.0),
                Mm(y),
                &fonts.regular,
            );
            layer.set_fill_color(Color::Rgb(Rgb::new(0.06, 0.73, 0.51, None)));
            layer.use_text(
                entry.status.label().to_uppercase(),
                9.0,
                Mm(165.0),
                Mm(y),
                &fonts.bold,
            );
            y -= 8.0;
        }
    }

    // Footer.
    layer.set_fill_color(slate_mid());
    layer.use_text(
        "This is an automated report generated by the LifeLine system.",
        7.5,
        Mm(MARGIN_MM),
        Mm(24.0),
        &fonts.regular,
    );
    layer.use_text(
        "Confidential document, for medical and official use only.",
        7.5,
        Mm(MARGIN_MM),
        Mm(19.5),
        &fonts.regular,
    );

    doc.save_to_bytes()
        .map_err(|err| ReportError::Render(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::domain::{
        IncidentId, IncidentKind, IncidentStatus, IncidentView, ReporterView, ResponderProgress,
        ResponderView, TimelineEntry, UserId, UserRole,
    };
    use crate::dispatch::geo::GeoPoint;
    use chrono::Utc;

    fn sample_view() -> IncidentView {
        IncidentView {
            id: IncidentId("sos-000042".to_string()),
            kind: IncidentKind::Accident,
            description: Some("Two-wheeler collision".to_string()),
            blood_group: None,
            contact_number: Some("+911234567890".to_string()),
            location: GeoPoint::new(22.5726, 88.3639).expect("valid point"),
            status: IncidentStatus::Active,
            priority_score: 65,
            timeline: vec![
                TimelineEntry::now("created", Some("Emergency alert raised".to_string())),
                TimelineEntry::now("acknowledged", Some("City Hospital accepted.".to_string())),
            ],
            responders: vec![ResponderView {
                user: UserId("hospital-1".to_string()),
                name: Some("City Hospital".to_string()),
                role: Some(UserRole::Hospital),
                status: ResponderProgress::Accepted,
                recorded_at: Utc::now(),
            }],
            created_at: Utc::now(),
            reporter: Some(ReporterView {
                id: UserId("user-1".to_string()),
                name: "Asha Verma".to_string(),
                phone: "+911234567890".to_string(),
                avatar_url: None,
            }),
        }
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = render_incident_report(&sample_view()).expect("report renders");
        assert!(bytes.len() > 500);
        assert_eq!(&bytes[..5], b"%PDF-");
    }

    #[test]
    fn renders_without_reporter_or_responders() {
        let mut view = sample_view();
        view.reporter = None;
        view.responders.clear();
        let bytes = render_incident_report(&view).expect("report renders");
        assert_eq!(&bytes[..5], b"%PDF-");
    }
}
