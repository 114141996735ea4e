use crate::error::{ReportError, ReportResult};
use crate::reports::CropTable;
use crate::types::Orientation;
use crate::util::title_case;
use docx_rs::{
    AlignmentType, BorderType, BreakType, Docx, Footer, PageMargin, PageOrientationType, Paragraph,
    ParagraphBorder, ParagraphBorderPosition, ParagraphBorders, Pic, Run, Table, TableCell,
    TableRow, VAlignType, VMergeType,
};
use image::GenericImageView;
use std::fs::File;
use std::path::Path;
use tabled::{builder::Builder, settings::Style};
use tracing::info;

// Page geometry in twips (1/1440 inch), US Letter.
const PAGE_SHORT_EDGE: u32 = 12240;
const PAGE_LONG_EDGE: u32 = 15840;
const MARGIN: i32 = 720;
const EMU_PER_INCH: u32 = 914_400;

// Run sizes are in half-points.
const SIZE_TITLE: usize = 22;
const SIZE_CROP: usize = 20;
const SIZE_HEADER_CELL: usize = 18;
const SIZE_BODY_CELL: usize = 16;
const SIZE_SMALL: usize = 16;
const CROP_COLOR: &str = "0050A0";

/// Logo bytes with their decoded pixel size and rendered height.
#[derive(Debug, Clone)]
pub struct Logo {
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
    /// Height in EMU when drawn one inch wide.
    pub height_emu: u32,
}

/// Height in EMU of a `width_px` x `height_px` image scaled to one inch
/// wide, or `None` when it does not fit the drawing size field.
fn logo_height_emu(width_px: u32, height_px: u32) -> Option<u32> {
    if width_px == 0 {
        return None;
    }
    let emu = u64::from(EMU_PER_INCH) * u64::from(height_px) / u64::from(width_px);
    u32::try_from(emu).ok()
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub orientation: Orientation,
    pub logo: Option<Logo>,
    pub title: String,
    pub subtitle: String,
    pub heading: String,
    pub footer: String,
    pub tables: Vec<CropTable>,
}

/// Read and decode the logo so a corrupt file is caught here, not while
/// the document is being packed.
pub fn load_logo(path: &Path) -> ReportResult<Logo> {
    let asset_err = |reason: String| ReportError::AssetLoad {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = std::fs::read(path).map_err(|e| asset_err(e.to_string()))?;
    let img = image::load_from_memory(&bytes).map_err(|e| asset_err(e.to_string()))?;
    let (width_px, height_px) = img.dimensions();
    if width_px == 0 || height_px == 0 {
        return Err(asset_err("image has no pixels".to_string()));
    }
    let height_emu = logo_height_emu(width_px, height_px).ok_or_else(|| {
        asset_err(format!("{}x{} px is too tall to draw one inch wide", width_px, height_px))
    })?;
    Ok(Logo {
        bytes,
        width_px,
        height_px,
        height_emu,
    })
}

fn centered(run: Run) -> Paragraph {
    Paragraph::new().add_run(run).align(AlignmentType::Center)
}

/// A run holding `text`, with embedded newlines turned into line breaks.
fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    run
}

fn cell(text: &str, bold: bool, size: usize) -> TableCell {
    let mut run = text_run(text).size(size);
    if bold {
        run = run.bold();
    }
    TableCell::new()
        .add_paragraph(centered(run))
        .vertical_align(VAlignType::Center)
}

fn header_rows(table: &CropTable) -> Vec<TableRow> {
    let bold_cell = |text: &str| cell(text, true, SIZE_HEADER_CELL);

    let mut top = Vec::new();
    let mut bottom = Vec::new();
    for head in &table.header[0] {
        let mut c = bold_cell(&head.text).grid_span(head.col_span);
        if head.row_span > 1 {
            c = c.vertical_merge(VMergeType::Restart);
            // The continuation cell occupies the same grid slot in row 1.
            bottom.push((
                head.column,
                TableCell::new()
                    .grid_span(head.col_span)
                    .vertical_merge(VMergeType::Continue),
            ));
        }
        top.push(c);
    }
    for sub in &table.header[1] {
        bottom.push((sub.column, bold_cell(&sub.text)));
    }
    bottom.sort_by_key(|(column, _)| *column);

    vec![
        TableRow::new(top),
        TableRow::new(bottom.into_iter().map(|(_, c)| c).collect()),
    ]
}

fn crop_table(table: &CropTable, usable_width: u32) -> Table {
    let mut rows = header_rows(table);
    debug_assert_eq!(rows.len(), CropTable::HEADER_ROWS);
    for values in &table.rows {
        rows.push(TableRow::new(
            values.iter().map(|v| cell(v, false, SIZE_BODY_CELL)).collect(),
        ));
    }
    let col_width = usable_width as usize / table.num_cols.max(1);
    Table::new(rows).set_grid(vec![col_width; table.num_cols])
}

/// Empty paragraph with a single bottom border spanning the text width.
fn horizontal_rule() -> Paragraph {
    Paragraph::new().set_borders(
        ParagraphBorders::with_empty().set(
            ParagraphBorder::new(ParagraphBorderPosition::Bottom)
                .val(BorderType::Single)
                .size(12)
                .space(1)
                .color("auto"),
        ),
    )
}

/// Assemble the docx: logo, title block, one table per crop separated by
/// page breaks, and the footer.
pub fn build_docx(doc: &ReportDocument) -> Docx {
    let (width, height) = match doc.orientation {
        Orientation::Portrait => (PAGE_SHORT_EDGE, PAGE_LONG_EDGE),
        Orientation::Landscape => (PAGE_LONG_EDGE, PAGE_SHORT_EDGE),
    };
    let mut docx = Docx::new()
        .page_size(width, height)
        .page_margin(
            PageMargin::new()
                .top(MARGIN)
                .bottom(MARGIN)
                .left(MARGIN)
                .right(MARGIN),
        );
    if doc.orientation == Orientation::Landscape {
        docx = docx.page_orient(PageOrientationType::Landscape);
    }

    if let Some(logo) = &doc.logo {
        let pic = Pic::new_with_dimensions(logo.bytes.clone(), logo.width_px, logo.height_px)
            .size(EMU_PER_INCH, logo.height_emu);
        docx = docx.add_paragraph(centered(Run::new().add_image(pic)));
    }

    docx = docx
        .add_paragraph(centered(Run::new().add_text(&doc.title).bold().size(SIZE_TITLE)))
        .add_paragraph(centered(Run::new().add_text(&doc.subtitle).size(SIZE_SMALL)))
        .add_paragraph(centered(Run::new().add_text(&doc.heading).bold().size(SIZE_TITLE)))
        .add_paragraph(horizontal_rule());

    let usable_width = width - 2 * MARGIN as u32;
    for (i, table) in doc.tables.iter().enumerate() {
        docx = docx
            .add_paragraph(centered(
                Run::new()
                    .add_text(table.crop.to_uppercase())
                    .bold()
                    .size(SIZE_CROP)
                    .color(CROP_COLOR),
            ))
            .add_table(crop_table(table, usable_width));
        if i + 1 < doc.tables.len() {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        }
    }

    docx.footer(Footer::new().add_paragraph(centered(
        Run::new().add_text(&doc.footer).size(SIZE_SMALL),
    )))
}

pub fn write_docx(path: &Path, doc: &ReportDocument) -> ReportResult<()> {
    let write_err = |reason: String| ReportError::Write {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::create(path).map_err(|e| write_err(e.to_string()))?;
    build_docx(doc)
        .build()
        .pack(file)
        .map_err(|e| write_err(e.to_string()))?;
    Ok(())
}

/// Print every crop table to stdout as Markdown, with flattened headers.
pub fn preview_tables(tables: &[CropTable]) {
    for table in tables {
        println!("\n{}\n", title_case(&table.crop));
        if table.rows.is_empty() {
            println!("(no rows)\n");
            continue;
        }
        let mut builder = Builder::default();
        builder.push_record(table.flat_header());
        for row in &table.rows {
            builder.push_record(row.clone());
        }
        let table_str = builder.build().with(Style::markdown()).to_string();
        println!("{}\n", table_str);
        info!(crop = %table.crop, rows = table.rows.len(), "previewed table");
    }
}
