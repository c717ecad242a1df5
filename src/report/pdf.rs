//! The PDF rendering of a report: an A4 table that continues across pages.

use std::io::BufWriter;

use printpdf::{
    path::{PaintMode, WindingOrder},
    *,
};

use crate::{
    Error,
    report::{REPORT_COLUMNS, ReportRow},
    validation::DATE_FORMAT,
};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 15.0;
const ROW_H: f32 = 7.0;
const CELL_PADDING: f32 = 1.5;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;

/// Column widths in millimetres, in the order of [REPORT_COLUMNS].
const COLUMN_WIDTHS: [f32; 5] = [24.0, 24.0, 42.0, 28.0, 62.0];

const HEADER_FILL: (f32, f32, f32) = (0.75, 0.75, 0.75);
const ROW_FILL: (f32, f32, f32) = (0.96, 0.96, 0.86);

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Average Helvetica character width in millimetres for each point of font
/// size, a little over half of a point (0.3528 mm).
const CHAR_WIDTH_MM_PER_PT: f32 = 0.19;

/// Cut text that would overflow its column.
fn fit_to_width(text: &str, width: f32) -> String {
    let char_width = FONT_SIZE * CHAR_WIDTH_MM_PER_PT;
    let max_chars = ((width - 2.0 * CELL_PADDING) / char_width).max(1.0) as usize;

    if text.chars().count() <= max_chars {
        return text.to_owned();
    }

    let mut fitted = text
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect::<String>();
    fitted.push_str("...");
    fitted
}

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    /// Distance from the top edge of the page.
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, Error> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|error| Error::PdfError(format!("{error:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|error| Error::PdfError(format!("{error:?}")))?;

        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN,
        })
    }

    fn layer(&self) -> PdfLayerReference {
        self.doc
            .get_page(self.current_page)
            .get_layer(self.current_layer)
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN;
    }

    fn needs_new_page(&self) -> bool {
        self.y + ROW_H > PAGE_H - MARGIN
    }

    fn title(&mut self, title: &str) {
        self.y += TITLE_SIZE * 0.35;
        self.layer().use_text(
            title,
            TITLE_SIZE,
            Mm(MARGIN),
            Mm(PAGE_H - self.y),
            &self.font_bold,
        );
        self.y += 6.0;
    }

    /// Draw one row of cells with a filled background and a black border.
    fn row(&mut self, values: &[&str], fill: (f32, f32, f32), bold: bool) {
        let layer = self.layer();
        let top = PAGE_H - self.y;
        let bottom = top - ROW_H;
        let font = if bold { &self.font_bold } else { &self.font };

        layer.set_fill_color(rgb(fill));
        layer.set_outline_color(rgb((0.0, 0.0, 0.0)));
        layer.set_outline_thickness(0.3);

        let mut x = MARGIN;
        for (value, width) in values.iter().zip(COLUMN_WIDTHS) {
            let cell = vec![
                (Point::new(Mm(x), Mm(top)), false),
                (Point::new(Mm(x + width), Mm(top)), false),
                (Point::new(Mm(x + width), Mm(bottom)), false),
                (Point::new(Mm(x), Mm(bottom)), false),
            ];
            layer.add_polygon(Polygon {
                rings: vec![cell],
                mode: PaintMode::FillStroke,
                winding_order: WindingOrder::NonZero,
            });

            layer.set_fill_color(rgb((0.0, 0.0, 0.0)));
            layer.use_text(
                fit_to_width(value, width),
                FONT_SIZE,
                Mm(x + CELL_PADDING),
                Mm(bottom + 2.2),
                font,
            );
            layer.set_fill_color(rgb(fill));

            x += width;
        }

        self.y += ROW_H;
    }

    fn table_header(&mut self) {
        self.row(&REPORT_COLUMNS, HEADER_FILL, true);
    }

    fn save(self) -> Result<Vec<u8>, Error> {
        let mut writer = BufWriter::new(Vec::new());
        self.doc
            .save(&mut writer)
            .map_err(|error| Error::PdfError(format!("{error:?}")))?;

        writer
            .into_inner()
            .map_err(|error| Error::PdfError(format!("{error:?}")))
    }
}

/// Render the rows as a titled table. The header row is repeated at the top
/// of every page.
pub fn render_pdf(title: &str, rows: &[ReportRow]) -> Result<Vec<u8>, Error> {
    let mut writer = PdfWriter::new(title)?;
    writer.title(title);
    writer.table_header();

    for row in rows {
        if writer.needs_new_page() {
            writer.new_page();
            writer.table_header();
        }

        let date = row
            .date
            .format(DATE_FORMAT)
            .map_err(|error| Error::PdfError(error.to_string()))?;
        let amount = row.amount.to_string();
        let values = [
            row.section.label(),
            &date,
            &row.category,
            &amount,
            row.comment.as_deref().unwrap_or_default(),
        ];

        writer.row(&values, ROW_FILL, false);
    }

    writer.save()
}
