//! End-to-end workbook scenarios over synthetic BIFF streams.

use super::*;
use crate::common::Error;
use crate::ole::SectorOwner;
use crate::ole::test_support::{RawContainer, RawEntry, cfb_container};
use crate::ole::xls::records::*;

fn bof(version: u16, kind: u16) -> Vec<u8> {
    let mut payload = version.to_le_bytes().to_vec();
    payload.extend_from_slice(&kind.to_le_bytes());
    payload.extend_from_slice(&[0u8; 12]);
    raw_record(RECORD_BOF, &payload)
}

fn eof() -> Vec<u8> {
    raw_record(RECORD_EOF, &[])
}

fn cell_header(row: u16, col: u16, xf: u16) -> Vec<u8> {
    [row.to_le_bytes(), col.to_le_bytes(), xf.to_le_bytes()].concat()
}

fn number(row: u16, col: u16, value: f64) -> Vec<u8> {
    number_xf(row, col, 0, value)
}

fn number_xf(row: u16, col: u16, xf: u16, value: f64) -> Vec<u8> {
    let mut payload = cell_header(row, col, xf);
    payload.extend_from_slice(&value.to_le_bytes());
    raw_record(RECORD_NUMBER, &payload)
}

fn label_sst(row: u16, col: u16, index: u32) -> Vec<u8> {
    let mut payload = cell_header(row, col, 0);
    payload.extend_from_slice(&index.to_le_bytes());
    raw_record(RECORD_LABELSST, &payload)
}

fn mul_rk(row: u16, first_col: u16, values: &[i32]) -> Vec<u8> {
    let mut payload = row.to_le_bytes().to_vec();
    payload.extend_from_slice(&first_col.to_le_bytes());
    for value in values {
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&(((*value as u32) << 2) | 0x01).to_le_bytes());
    }
    let last = first_col + values.len() as u16 - 1;
    payload.extend_from_slice(&last.to_le_bytes());
    raw_record(RECORD_MULRK, &payload)
}

fn mul_blank(row: u16, first_col: u16, count: u16) -> Vec<u8> {
    let mut payload = row.to_le_bytes().to_vec();
    payload.extend_from_slice(&first_col.to_le_bytes());
    for _ in 0..count {
        payload.extend_from_slice(&15u16.to_le_bytes());
    }
    payload.extend_from_slice(&(first_col + count - 1).to_le_bytes());
    raw_record(RECORD_MULBLANK, &payload)
}

fn sst(strings: &[&str]) -> Vec<u8> {
    let mut payload = (strings.len() as u32).to_le_bytes().to_vec();
    payload.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    for s in strings {
        payload.extend_from_slice(&(s.len() as u16).to_le_bytes());
        payload.push(0x00);
        payload.extend_from_slice(s.as_bytes());
    }
    raw_record(RECORD_SST, &payload)
}

/// A sheet description: name, BOUNDSHEET kind/visibility, body records.
struct SheetDef<'a> {
    name: &'a str,
    kind: u8,
    visibility: u8,
    body: Vec<Vec<u8>>,
}

impl<'a> SheetDef<'a> {
    fn worksheet(name: &'a str, body: Vec<Vec<u8>>) -> Self {
        SheetDef {
            name,
            kind: 0,
            visibility: 0,
            body,
        }
    }
}

fn bound_sheet(def: &SheetDef<'_>, position: u32, biff8: bool) -> Vec<u8> {
    let mut payload = position.to_le_bytes().to_vec();
    payload.push(def.visibility);
    payload.push(def.kind);
    if biff8 {
        payload.push(def.name.len() as u8);
        payload.push(0x00);
        payload.extend_from_slice(def.name.as_bytes());
    } else {
        let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(def.name);
        payload.push(bytes.len() as u8);
        payload.extend_from_slice(&bytes);
    }
    raw_record(RECORD_BOUNDSHEET, &payload)
}

/// Lay out globals followed by one substream per sheet, with BOUNDSHEET
/// offsets pointing at each sheet's BOF.
fn biff_stream(version: u16, globals: &[Vec<u8>], sheets: &[SheetDef<'_>]) -> Vec<u8> {
    let biff8 = version == 0x0600;
    let sheet_kind = |def: &SheetDef<'_>| if def.kind == 2 { 0x0020 } else { 0x0010 };
    let bodies: Vec<Vec<u8>> = sheets
        .iter()
        .map(|def| {
            let mut out = bof(version, sheet_kind(def));
            for record in &def.body {
                out.extend_from_slice(record);
            }
            out.extend(eof());
            out
        })
        .collect();

    let mut head = bof(version, 0x0005);
    for record in globals {
        head.extend_from_slice(record);
    }
    let bound_len: usize = sheets.iter().map(|s| bound_sheet(s, 0, biff8).len()).sum();
    let mut position = head.len() + bound_len + eof().len();
    for (def, body) in sheets.iter().zip(&bodies) {
        head.extend(bound_sheet(def, position as u32, biff8));
        position += body.len();
    }
    head.extend(eof());
    for body in bodies {
        head.extend(body);
    }
    head
}

fn parse(data: &[u8]) -> crate::common::Result<Workbook> {
    Workbook::parse(data, &ParseOptions::default())
}

fn single_number_workbook() -> Vec<u8> {
    biff_stream(
        0x0600,
        &[raw_record(RECORD_CODEPAGE, &1200u16.to_le_bytes())],
        &[SheetDef::worksheet("Sheet1", vec![number(0, 0, 42.0)])],
    )
}

#[test]
fn test_single_numeric_cell() {
    let data = cfb_container(&[("/Workbook", &single_number_workbook())]);
    let workbook = parse(&data).unwrap();

    assert_eq!(workbook.version(), BiffVersion::Biff8);
    assert_eq!(workbook.codepage(), 1200);
    assert_eq!(workbook.sheet_names(), vec!["Sheet1"]);
    let sheet = &workbook.sheets()[0];
    assert_eq!((sheet.nrows(), sheet.ncols()), (1, 1));
    assert_eq!(sheet.cell_value(0, 0), &CellValue::Number(42.0));
    assert!(!workbook.is_truncated());
    assert!(workbook.warnings().is_empty());
}

#[test]
fn test_out_of_range_cells_are_dropped() {
    let stream = biff_stream(
        0x0600,
        &[],
        &[SheetDef::worksheet(
            "Data",
            vec![
                number(2, 1, 1.5),
                number(0, 300, 9.0),
                // Columns 254, 255 fit; 256 does not.
                mul_rk(4, 254, &[7, -3, 11]),
            ],
        )],
    );
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();
    let sheet = workbook.sheet_by_name("Data").unwrap();

    assert_eq!((sheet.nrows(), sheet.ncols()), (5, 256));
    assert_eq!(sheet.len(), 3);
    assert_eq!(sheet.cell_value(4, 255), &CellValue::Number(-3.0));
    let dropped: Vec<_> = workbook
        .warnings()
        .iter()
        .filter_map(|w| match w {
            Warning::CellOutOfRange { row, col, .. } => Some((*row, *col)),
            _ => None,
        })
        .collect();
    assert_eq!(dropped, vec![(0, 300), (4, 256)]);
}

#[test]
fn test_dimension_record_does_not_widen_sheet() {
    let mut dims = 0u32.to_le_bytes().to_vec();
    dims.extend_from_slice(&60_000u32.to_le_bytes());
    dims.extend_from_slice(&0u16.to_le_bytes());
    dims.extend_from_slice(&200u16.to_le_bytes());
    dims.extend_from_slice(&0u16.to_le_bytes());
    let stream = biff_stream(
        0x0600,
        &[],
        &[SheetDef::worksheet(
            "Sheet1",
            vec![raw_record(RECORD_DIMENSION, &dims), number(1, 1, 2.0)],
        )],
    );
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();
    let sheet = workbook.sheet(0).unwrap();
    assert_eq!((sheet.nrows(), sheet.ncols()), (2, 2));
    assert_eq!(sheet.declared_dimensions().unwrap().last_row, 60_000);
}

#[test]
fn test_shared_strings_resolve_across_sheets() {
    let stream = biff_stream(
        0x0600,
        &[sst(&["alpha", "beta"])],
        &[
            SheetDef::worksheet("First", vec![label_sst(0, 0, 1)]),
            SheetDef::worksheet("Second", vec![label_sst(0, 0, 0), label_sst(1, 0, 9)]),
        ],
    );
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();

    let text = |sheet: usize, row: u32| match workbook.sheets()[sheet].cell_value(row, 0) {
        CellValue::Text(text) => workbook.resolve_text(text),
        other => panic!("unexpected value {:?}", other),
    };
    assert_eq!(text(0, 0), Some("beta"));
    assert_eq!(text(1, 0), Some("alpha"));
    assert_eq!(text(1, 1), None);
    assert!(matches!(
        workbook.warnings(),
        [Warning::SharedStringOutOfRange { index: 9, table_len: 2, .. }]
    ));
}

#[test]
fn test_formula_string_result_and_tokens() {
    let mut formula = cell_header(0, 0, 0);
    formula.extend_from_slice(&[0x00, 0, 0, 0, 0, 0, 0xFF, 0xFF]);
    formula.extend_from_slice(&[0; 6]); // flags, chn
    formula.extend_from_slice(&3u16.to_le_bytes());
    formula.extend_from_slice(&[0x17, 0x01, 0x00]);
    let mut string = 5u16.to_le_bytes().to_vec();
    string.push(0x00);
    string.extend_from_slice(b"total");

    let mut bool_formula = cell_header(1, 0, 0);
    bool_formula.extend_from_slice(&[0x01, 0, 0x01, 0, 0, 0, 0xFF, 0xFF]);
    bool_formula.extend_from_slice(&[0; 6]);
    bool_formula.extend_from_slice(&0u16.to_le_bytes());

    let stream = biff_stream(
        0x0600,
        &[],
        &[SheetDef::worksheet(
            "Calc",
            vec![
                raw_record(RECORD_FORMULA, &formula),
                raw_record(RECORD_STRING, &string),
                raw_record(RECORD_FORMULA, &bool_formula),
            ],
        )],
    );
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();
    let sheet = workbook.sheet(0).unwrap();

    assert_eq!(
        sheet.cell_value(0, 0),
        &CellValue::Formula(FormulaResult::Text("total".into()))
    );
    assert_eq!(sheet.formula_tokens(0, 0), Some(&[0x17, 0x01, 0x00][..]));
    assert_eq!(
        sheet.cell_value(1, 0),
        &CellValue::Formula(FormulaResult::Bool(true))
    );
    assert_eq!(sheet.formula_tokens(1, 0), Some(&[][..]));
}

#[test]
fn test_blank_cells_are_opt_in() {
    let stream = biff_stream(
        0x0600,
        &[],
        &[SheetDef::worksheet("Sheet1", vec![number(0, 0, 1.0), mul_blank(0, 1, 3)])],
    );

    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();
    assert_eq!(workbook.sheet(0).unwrap().ncols(), 1);

    let options = ParseOptions::new().with_blank_cells(true);
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &options).unwrap();
    let sheet = workbook.sheet(0).unwrap();
    assert_eq!(sheet.ncols(), 4);
    assert_eq!(sheet.cell(0, 3).unwrap().xf_index, 15);
    assert!(sheet.cell(0, 3).unwrap().value.is_empty());
}

#[test]
fn test_formats_and_date_mode() {
    let mut format = 164u16.to_le_bytes().to_vec();
    format.extend_from_slice(&[4, 0, 0x00]);
    format.extend_from_slice(b"0.0%");
    let mut xf_general = vec![0u8; 20];
    xf_general[4] = 0xF5;
    xf_general[5] = 0xFF;
    let mut xf_percent = vec![0u8; 20];
    xf_percent[2..4].copy_from_slice(&164u16.to_le_bytes());

    let stream = biff_stream(
        0x0600,
        &[
            raw_record(RECORD_DATEMODE, &1u16.to_le_bytes()),
            raw_record(RECORD_FORMAT, &format),
            raw_record(RECORD_XF, &xf_general),
            raw_record(RECORD_XF, &xf_percent),
        ],
        &[SheetDef::worksheet("Sheet1", vec![number_xf(0, 0, 1, 0.25)])],
    );
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();

    assert!(workbook.is_1904());
    let cell = workbook.sheet(0).unwrap().cell(0, 0).unwrap();
    assert_eq!(workbook.number_format(cell.xf_index), Some("0.0%"));
    assert_eq!(workbook.number_format(0), Some("General"));
    assert!(workbook.formats().xf(0).unwrap().is_style);
}

#[test]
fn test_non_worksheet_sheets_have_empty_grids() {
    let chart = SheetDef {
        name: "Chart1",
        kind: 2,
        visibility: 1,
        body: vec![number(0, 0, 1.0)],
    };
    let stream = biff_stream(
        0x0600,
        &[],
        &[SheetDef::worksheet("Sheet1", vec![number(0, 0, 1.0)]), chart],
    );
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();
    let chart = workbook.sheet_by_name("Chart1").unwrap();
    assert_eq!(chart.kind(), SheetKind::Chart);
    assert_eq!(chart.visibility(), SheetVisibility::Hidden);
    assert!(chart.is_empty());
    assert!(!workbook.is_truncated());
}

#[test]
fn test_sheet_offset_out_of_range() {
    let mut stream = single_number_workbook();
    // Point the BOUNDSHEET far past the end of the stream.
    let bound = stream
        .windows(2)
        .position(|w| w == RECORD_BOUNDSHEET.to_le_bytes())
        .unwrap();
    stream[bound + 4..bound + 8].copy_from_slice(&0x00FF_0000u32.to_le_bytes());
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();
    assert!(workbook.sheet(0).unwrap().is_empty());
    assert!(workbook.is_truncated());
    assert!(matches!(workbook.warnings(), [Warning::SheetOffsetOutOfRange { .. }]));
}

#[test]
fn test_every_truncation_of_the_record_stream() {
    let full = biff_stream(
        0x0600,
        &[sst(&["a", "bb", "ccc"])],
        &[
            SheetDef::worksheet("One", vec![number(0, 0, 42.0), label_sst(1, 0, 2)]),
            SheetDef::worksheet("Two", vec![mul_rk(0, 0, &[1, 2, 3])]),
        ],
    );
    let options = ParseOptions::default();
    for cut in 0..full.len() {
        match Workbook::from_biff_stream(&full[..cut], BiffVersion::Biff8, &options) {
            Ok(workbook) => {
                assert!(workbook.is_truncated(), "cut at {} not flagged", cut);
                if let Some(cell) = workbook.sheet(0).and_then(|s| s.cell(0, 0)) {
                    assert_eq!(cell.value, CellValue::Number(42.0));
                }
            },
            Err(e) => assert!(
                matches!(e, Error::CorruptRecord { .. }),
                "cut at {}: {}",
                cut,
                e
            ),
        }
    }
    let workbook = Workbook::from_biff_stream(&full, BiffVersion::Biff8, &options).unwrap();
    assert!(!workbook.is_truncated());
}

#[test]
fn test_every_truncation_of_the_container() {
    let data = cfb_container(&[("/Workbook", &single_number_workbook())]);
    for cut in 0..data.len() {
        // Must terminate without panicking whatever the outcome.
        let _ = parse(&data[..cut]);
    }
}

#[test]
fn test_truncated_container_keeps_leading_cells() {
    let body: Vec<Vec<u8>> = (0..600).map(|row| number(row, 0, f64::from(row))).collect();
    let stream = biff_stream(0x0600, &[], &[SheetDef::worksheet("Big", body)]);
    let mut data = cfb_container(&[("/Workbook", &stream)]);
    data.truncate(data.len() - 2048);

    let workbook = parse(&data).unwrap();
    assert!(workbook.is_truncated());
    let sheet = workbook.sheet(0).unwrap();
    assert!(sheet.is_truncated());
    assert!(!sheet.is_empty() && sheet.len() < 600);
    assert_eq!(sheet.cell_value(0, 0), &CellValue::Number(0.0));
}

#[test]
fn test_encrypted_workbook_is_unsupported() {
    let stream = biff_stream(
        0x0600,
        &[raw_record(RECORD_FILEPASS, &[0x01, 0x00, 0x01, 0x00])],
        &[SheetDef::worksheet("Sheet1", vec![number(0, 0, 1.0)])],
    );
    let data = cfb_container(&[("/Workbook", &stream)]);
    assert!(matches!(parse(&data), Err(Error::UnsupportedFormat(m)) if m.contains("encrypted")));
}

#[test]
fn test_biff4_is_unsupported() {
    let mut stream = raw_record(RECORD_BOF_BIFF4, &[0x00, 0x00, 0x10, 0x00, 0x00, 0x00]);
    stream.extend(eof());
    let data = cfb_container(&[("/Book", &stream)]);
    assert!(matches!(parse(&data), Err(Error::UnsupportedFormat(_))));
}

#[test]
fn test_biff5_book_uses_codepage() {
    let mut label = cell_header(0, 0, 0);
    label.extend_from_slice(&3u16.to_le_bytes());
    label.extend_from_slice(&[0xC4, 0xE0, 0xED]); // "Дан" in cp1251
    let stream = biff_stream(
        0x0500,
        &[raw_record(RECORD_CODEPAGE, &1251u16.to_le_bytes())],
        &[SheetDef::worksheet(
            "Лист",
            vec![
                raw_record(RECORD_LABEL, &label),
                // BIFF5 sheets stop at row 16384.
                number(20_000, 0, 1.0),
            ],
        )],
    );
    let data = cfb_container(&[("/Book", &stream)]);
    let workbook = parse(&data).unwrap();

    assert_eq!(workbook.version(), BiffVersion::Biff5);
    assert_eq!(workbook.codepage(), 1251);
    let sheet = workbook.sheet_by_name("Лист").unwrap();
    assert_eq!(sheet.cell_value(0, 0).as_inline_str(), Some("Дан"));
    assert_eq!(sheet.nrows(), 1);
    assert!(matches!(workbook.warnings(), [Warning::CellOutOfRange { row: 20_000, .. }]));
}

#[test]
fn test_biff5_unknown_codepage_is_unsupported() {
    let stream = biff_stream(
        0x0500,
        &[raw_record(RECORD_CODEPAGE, &437u16.to_le_bytes())],
        &[],
    );
    let data = cfb_container(&[("/Book", &stream)]);
    assert!(matches!(parse(&data), Err(Error::UnsupportedFormat(_))));
}

#[test]
fn test_missing_workbook_stream() {
    let data = cfb_container(&[("/Other", b"not a workbook")]);
    assert!(matches!(parse(&data), Err(Error::CorruptContainer(m)) if m.contains("Workbook")));
}

#[test]
fn test_workbook_corruption_is_opt_in() {
    let stream = single_number_workbook();
    assert!(stream.len() < 512);
    let mut raw = RawContainer::new(4);
    // The workbook chain runs from data sector 2 into the directory sector.
    raw.link(&[2, 1])
        .write_sector(2, &stream)
        .entry(0, RawEntry::root(1))
        .entry(1, RawEntry::stream("Workbook", 2, 4096));
    let data = raw.build();

    match parse(&data) {
        Err(Error::CorruptContainer(message)) => assert!(message.contains("workbook corruption")),
        other => panic!("expected workbook corruption, got {:?}", other.map(|w| w.sheet_names().len())),
    }

    let options = ParseOptions::new().with_ignore_workbook_corruption(true);
    let workbook = Workbook::parse(&data, &options).unwrap();
    assert_eq!(workbook.sheet(0).unwrap().cell_value(0, 0), &CellValue::Number(42.0));
    assert!(workbook.warnings().contains(&Warning::SectorOverlap {
        sector: 1,
        owner: SectorOwner::Directory,
    }));
}

#[test]
fn test_repeated_sheet_offset_is_decoded_once() {
    let names: Vec<String> = (0..50).map(|i| format!("Copy{}", i)).collect();
    let defs: Vec<SheetDef<'_>> = names
        .iter()
        .map(|name| SheetDef::worksheet(name, Vec::new()))
        .collect();
    let body: Vec<Vec<u8>> = (0..40).map(|row| number(row, 0, f64::from(row))).collect();

    let mut stream = bof(0x0600, 0x0005);
    let bound_len: usize = defs.iter().map(|d| bound_sheet(d, 0, true).len()).sum();
    let position = (stream.len() + bound_len + eof().len()) as u32;
    for def in &defs {
        stream.extend(bound_sheet(def, position, true));
    }
    stream.extend(eof());
    stream.extend(bof(0x0600, 0x0010));
    for record in &body {
        stream.extend_from_slice(record);
    }
    stream.extend(eof());

    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();
    assert_eq!(workbook.sheets().len(), 50);
    assert_eq!(workbook.sheet(0).unwrap().len(), 40);
    let stored: usize = workbook.sheets().iter().map(Sheet::len).sum();
    assert_eq!(stored, 40);

    let repeats: Vec<_> = workbook
        .warnings()
        .iter()
        .filter_map(|w| match w {
            Warning::DuplicateSheetOffset { sheet, first, .. } => Some((sheet.as_str(), first.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(repeats.len(), 49);
    assert_eq!(repeats[0], ("Copy1", "Copy0"));
}

fn formula_record(row: u16, col: u16, tokens: &[u8]) -> Vec<u8> {
    let mut payload = cell_header(row, col, 0);
    payload.extend_from_slice(&0.0f64.to_le_bytes());
    payload.extend_from_slice(&[0; 6]); // flags, chn
    payload.extend_from_slice(&(tokens.len() as u16).to_le_bytes());
    payload.extend_from_slice(tokens);
    raw_record(RECORD_FORMULA, &payload)
}

#[test]
fn test_formula_text() {
    let mut name = vec![0x00, 0x00, 0x00, 0x04, 0x09, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0x00];
    name.extend_from_slice(b"Rate");
    name.push(0x1F);
    name.extend_from_slice(&0.5f64.to_le_bytes());

    // Inputs!A1*Rate
    let product = [0x5A, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x43, 0x01, 0x00, 0x00, 0x00, 0x05];
    // Column to the left, same row, plus one: B2:B3 shared
    let mut shared = vec![0x01, 0x00, 0x02, 0x00, 0x01, 0x01, 0x00, 0x02];
    let definition = [0x4C, 0x00, 0x00, 0xFF, 0xC0, 0x1E, 0x01, 0x00, 0x03];
    shared.extend_from_slice(&(definition.len() as u16).to_le_bytes());
    shared.extend_from_slice(&definition);
    let exp = [0x01, 0x01, 0x00, 0x01, 0x00];

    let stream = biff_stream(
        0x0600,
        &[
            raw_record(RECORD_SUPBOOK, &[0x02, 0x00, 0x01, 0x04]),
            raw_record(RECORD_EXTERNSHEET, &[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
            raw_record(RECORD_NAME, &name),
        ],
        &[
            SheetDef::worksheet("Inputs", vec![number(0, 0, 2.0)]),
            SheetDef::worksheet(
                "Calc",
                vec![
                    formula_record(0, 0, &product),
                    formula_record(1, 1, &exp),
                    raw_record(RECORD_SHRFMLA, &shared),
                    formula_record(2, 1, &exp),
                    formula_record(3, 0, &[0x80]),
                ],
            ),
        ],
    );
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();
    assert!(workbook.warnings().is_empty());

    let names = workbook.defined_names();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].name, "Rate");
    assert_eq!(workbook.name_formula(&names[0]).unwrap(), "0.5");

    let calc = workbook.sheet_by_name("Calc").unwrap();
    assert_eq!(calc.shared_formulas().count(), 1);
    assert_eq!(workbook.formula_text(calc, 0, 0).unwrap(), "Inputs!A1*Rate");

    let map = workbook.formula_map(calc);
    assert_eq!(map.len(), 3);
    assert_eq!(map[&(1, 1)], "A2+1");
    assert_eq!(map[&(2, 1)], "A3+1");
    assert!(!map.contains_key(&(3, 0)));

    assert_eq!(
        workbook.decompile_formula(calc, 3, 0),
        Some(Err(FormulaError::UnsupportedToken { ptg: 0x80, offset: 0 }))
    );
    assert!(workbook.decompile_formula(calc, 9, 9).is_none());
}

#[test]
fn test_shared_formula_between_formula_and_string() {
    let mut formula = cell_header(0, 0, 0);
    formula.extend_from_slice(&[0x00, 0, 0, 0, 0, 0, 0xFF, 0xFF]);
    formula.extend_from_slice(&[0; 6]);
    let exp = [0x01, 0x00, 0x00, 0x00, 0x00];
    formula.extend_from_slice(&(exp.len() as u16).to_le_bytes());
    formula.extend_from_slice(&exp);

    // "x" shared over A1:A1
    let mut shared = vec![0, 0, 0, 0, 0, 0, 0, 1];
    shared.extend_from_slice(&4u16.to_le_bytes());
    shared.extend_from_slice(&[0x17, 0x01, 0x00, b'x']);
    let mut string = 1u16.to_le_bytes().to_vec();
    string.extend_from_slice(&[0x00, b'x']);

    let stream = biff_stream(
        0x0600,
        &[],
        &[SheetDef::worksheet(
            "Text",
            vec![
                raw_record(RECORD_FORMULA, &formula),
                raw_record(RECORD_SHRFMLA, &shared),
                raw_record(RECORD_STRING, &string),
            ],
        )],
    );
    let workbook = Workbook::from_biff_stream(&stream, BiffVersion::Biff8, &ParseOptions::default()).unwrap();
    let sheet = workbook.sheet(0).unwrap();
    assert_eq!(sheet.cell_value(0, 0), &CellValue::Formula(FormulaResult::Text("x".into())));
    assert_eq!(workbook.formula_text(sheet, 0, 0).unwrap(), "\"x\"");
}
