// Shared fixtures for the integration tests: a small seeded database and
// helpers to read produced workbooks back with calamine.
#![allow(dead_code)]

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rpt_reports::{Connections, RunConfig, Runner, Source};
use rusqlite::Connection;
use std::io::Read;
use std::path::Path;

/// Row of the header on every report sheet (caption, detail, run date, blank)
pub const HEADER_ROW: usize = 4;
/// First data row
pub const FIRST_ROW: usize = 5;

const SCHEMA: &str = "
CREATE TABLE customer (cust_id TEXT PRIMARY KEY, name TEXT, sales_rep TEXT);
CREATE TABLE vendor (vendor_id INTEGER PRIMARY KEY, name TEXT);
CREATE TABLE item (
    item_id TEXT PRIMARY KEY, description TEXT, vendor_id INTEGER, dept TEXT,
    weight REAL, cost REAL, base_price REAL, never_out INTEGER
);
CREATE TABLE inventory (item_id TEXT, wh_id TEXT, qty_on_hand REAL, qty_on_order REAL);
CREATE TABLE sale (
    inv_date TEXT, cust_id TEXT, item_id TEXT, wh_id TEXT,
    qty REAL, amount REAL, cost REAL
);
CREATE TABLE po_header (po_nbr TEXT, vendor_id INTEGER, wh_id TEXT, po_date TEXT);
CREATE TABLE po_line (po_nbr TEXT, line_no INTEGER, item_id TEXT, qty_ordered REAL, unit_cost REAL);
CREATE TABLE po_receipt (po_nbr TEXT, line_no INTEGER, rcv_date TEXT, qty_received REAL, receiver TEXT);
CREATE TABLE promotion (promo_id TEXT, description TEXT, beg_date TEXT, end_date TEXT);
CREATE TABLE promo_item (promo_id TEXT, item_id TEXT, promo_price REAL);
CREATE TABLE freight_adder (vendor_id INTEGER, min_weight REAL, max_weight REAL, adder REAL);
CREATE TABLE ar_customer (cust_id TEXT, credit_limit REAL, balance REAL);
";

const SEED: &str = "
INSERT INTO customer VALUES
    ('C100', 'Acme Hardware', 'JS'),
    ('C200', 'Blue Ridge Supply', 'MK'),
    ('C300', 'Cedar Lumber', 'JS');

INSERT INTO vendor VALUES
    (10, 'Northwind Tools'),
    (20, 'Summit Fasteners'),
    (30, 'Empty Vendor');

INSERT INTO item VALUES
    ('A1', 'Claw Hammer',     10, 'HW',  2.0,  6.0, 12.0, 1),
    ('A2', 'Sledge Hammer',   10, 'HW', 12.0, 20.0, 24.0, 0),
    ('B1', 'Wood Screws 1lb', 20, 'FS',  1.0,  3.0,  5.0, 1),
    ('B2', 'Lag Bolts',       20, 'FS', 60.0, 40.0, 45.0, 0);

INSERT INTO inventory VALUES
    ('A1', 'W1',   5, 10),
    ('A1', 'W2',   0,  0),
    ('B1', 'W1', 100,  0),
    ('A2', 'W1',   3,  0);

INSERT INTO sale VALUES
    ('2023-06-30', 'C100', 'A1', 'W1',  1,  12,  6),
    ('2023-07-05', 'C300', 'A2', 'W1',  1,  24, 20),
    ('2024-02-15', 'C100', 'A1', 'W1',  4,  48, 24),
    ('2024-03-10', 'C100', 'A1', 'W1',  8,  96, 48),
    ('2024-03-15', 'C100', 'B1', 'W1', 20, 100, 60),
    ('2024-03-20', 'C200', 'A1', 'W1', 12, 144, 72),
    ('2024-06-01', 'C200', 'B2', 'W1',  2,  90, 80);

INSERT INTO po_header VALUES
    ('P1', 10, 'W1', '2024-01-05'),
    ('P2', 20, 'W1', '2024-01-10'),
    ('P3', 10, 'W1', '2023-12-01');

INSERT INTO po_line VALUES
    ('P1', 1, 'A1',  10,  6.0),
    ('P1', 2, 'A2',   5, 20.0),
    ('P2', 1, 'B1', 100,  3.0),
    ('P3', 1, 'A1',   7,  6.0);

INSERT INTO po_receipt VALUES
    ('P1', 1, '2024-01-12',  10, 'JDOE'),
    ('P1', 2, '2024-01-12',   2, 'JDOE'),
    ('P1', 2, '2024-01-20',   1, 'MSMITH'),
    ('P2', 1, '2024-01-15', 100, 'JDOE'),
    ('P3', 1, '2023-12-10',   7, 'JDOE');

INSERT INTO promotion VALUES
    ('SPRING', 'Spring Tool Sale',  '2024-04-01', '2024-04-30'),
    ('MAY',    'May Fastener Days', '2024-05-01', '2024-05-15'),
    ('WINTER', 'Winter Clearance',  '2024-01-01', '2024-01-31');

INSERT INTO promo_item VALUES
    ('SPRING', 'A1',  9.0),
    ('SPRING', 'A2', 18.0),
    ('MAY',    'B1',  2.5),
    ('MAY',    'B2', 35.0),
    ('WINTER', 'A1', 10.0);

INSERT INTO freight_adder VALUES
    (10,  0.0, 10.0,  0.50),
    (10, 10.0, NULL,  2.00),
    (20,  0.0, 50.0,  0.25),
    (20, 50.0, NULL,  5.00);

INSERT INTO ar_customer VALUES
    ('C100',  5000.0, 1250.5),
    ('C200', 10000.0,    0.0);
";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory database with the full schema and seed rows
pub fn seeded() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn.execute_batch(SEED).unwrap();
    conn
}

/// One seeded connection per source
pub fn connections(sources: &[Source]) -> Connections {
    let mut conns = Connections::new();
    for source in sources {
        conns.insert(*source, seeded());
    }
    conns
}

/// Runner with every source connected, writing into `dir`
pub fn runner(dir: &Path) -> Runner {
    init_logging();
    Runner::new(connections(&Source::ALL), RunConfig::new(dir))
}

pub fn sheet_names(path: &Path) -> Vec<String> {
    let workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.sheet_names().to_vec()
}

/// Raw XML of the `index`th worksheet (1-based), for what calamine does not
/// expose: conditional formats and data validation
pub fn sheet_xml(path: &Path, index: usize) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive
        .by_name(&format!("xl/worksheets/sheet{}.xml", index))
        .unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    xml
}

pub fn open_sheet(path: &Path, name: &str) -> Range<Data> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    workbook.worksheet_range(name).unwrap()
}

fn cell(range: &Range<Data>, row: usize, col: usize) -> Data {
    range.get((row, col)).cloned().unwrap_or(Data::Empty)
}

/// Cell as text; numbers are shown with calamine's formatting
pub fn text(range: &Range<Data>, row: usize, col: usize) -> String {
    match cell(range, row, col) {
        Data::String(s) => s,
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Numeric cell (plain number or date serial)
pub fn number(range: &Range<Data>, row: usize, col: usize) -> f64 {
    match cell(range, row, col) {
        Data::Float(v) => v,
        Data::Int(v) => v as f64,
        Data::DateTime(dt) => dt.as_f64(),
        other => panic!("cell ({}, {}) is not a number: {:?}", row, col, other),
    }
}

pub fn is_empty(range: &Range<Data>, row: usize, col: usize) -> bool {
    matches!(cell(range, row, col), Data::Empty)
}

/// Header titles of a report sheet
pub fn header(range: &Range<Data>) -> Vec<String> {
    let width = range.get_size().1;
    (0..width)
        .map(|col| text(range, HEADER_ROW, col))
        .take_while(|title| !title.is_empty())
        .collect()
}

/// First-column texts of the data rows, stopping at the first blank
pub fn first_column(range: &Range<Data>) -> Vec<String> {
    (FIRST_ROW..range.get_size().0)
        .map(|row| text(range, row, 0))
        .take_while(|value| !value.is_empty())
        .collect()
}

pub fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}
