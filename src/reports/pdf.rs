use crate::error::Error;
use crate::reports::stats::{DailyReport, WeeklyTrendReport};
use anyhow::Result;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 20.0;
const LINE_HEIGHT_MM: f64 = 7.0;

struct PageWriter {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f64,
}

impl PageWriter {
    fn heading(&mut self, text: &str) {
        self.layer
            .use_text(text, 18.0, Mm(MARGIN_MM), Mm(self.y), &self.bold);
        self.y -= LINE_HEIGHT_MM * 2.0;
    }

    fn section(&mut self, text: &str) {
        self.y -= LINE_HEIGHT_MM / 2.0;
        self.layer
            .use_text(text, 13.0, Mm(MARGIN_MM), Mm(self.y), &self.bold);
        self.y -= LINE_HEIGHT_MM;
    }

    fn line(&mut self, text: &str) {
        self.layer
            .use_text(text, 11.0, Mm(MARGIN_MM + 4.0), Mm(self.y), &self.regular);
        self.y -= LINE_HEIGHT_MM;
    }
}

fn start_document(title: &str) -> Result<(printpdf::PdfDocumentReference, PageWriter)> {
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");

    // Builtin Helvetica keeps the writer font-file free; Turkish characters
    // in category labels degrade under its WinAnsi encoding.
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::Report(format!("Failed to load PDF font: {}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| Error::Report(format!("Failed to load PDF font: {}", e)))?;

    let writer = PageWriter {
        layer: doc.get_page(page).get_layer(layer),
        regular,
        bold,
        y: PAGE_HEIGHT_MM - 25.0,
    };

    Ok((doc, writer))
}

fn save_document(doc: printpdf::PdfDocumentReference, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        Error::Io(format!(
            "Failed to create report file {}: {}",
            path.display(),
            e
        ))
    })?;

    doc.save(&mut BufWriter::new(file))
        .map_err(|e| Error::Report(format!("Failed to write PDF: {}", e)))?;

    Ok(())
}

/// Render the daily report artifact
pub fn write_daily_report(path: &Path, report: &DailyReport) -> Result<()> {
    let (doc, mut page) = start_document("Security Tower - Daily Report")?;

    page.heading(&format!("Daily Security Report - {}", report.date));

    let summary = &report.summary;
    page.section("Summary");
    page.line(&format!("Total alarms: {}", summary.total_alarms));
    page.line(&format!("AI verified: {}", summary.ai_verified_alarms));

    page.section("Risk distribution");
    for (risk, count) in &summary.risk_distribution {
        page.line(&format!("{}: {}", risk, count));
    }

    page.section("Alarm types");
    for (alarm_type, count) in &summary.alarm_types {
        page.line(&format!("{}: {}", alarm_type, count));
    }

    page.section("Busiest hours");
    let mut hours = summary.hourly_distribution.clone();
    hours.sort_by(|a, b| b.count.cmp(&a.count));
    for bucket in hours.iter().take(6).filter(|b| b.count > 0) {
        page.line(&format!("{}: {} alarms", bucket.hour, bucket.count));
    }

    save_document(doc, path)
}

/// Render the weekly trend artifact
pub fn write_weekly_report(path: &Path, report: &WeeklyTrendReport) -> Result<()> {
    let (doc, mut page) = start_document("Security Tower - Weekly Report")?;

    page.heading(&format!(
        "Weekly Security Report ({} / {})",
        report.period.start, report.period.end
    ));

    page.section("Summary");
    page.line(&format!("Total alarms: {}", report.total_alarms));
    page.line(&format!("AI accuracy: {}%", report.ai_accuracy));

    page.section("Daily trend");
    for day in &report.daily_trend {
        page.line(&format!(
            "{}  total {:>3}  verified {:>3}  high risk {:>3}",
            day.date, day.total, day.verified, day.high_risk
        ));
    }

    save_document(doc, path)
}
