// ==========================================
// Takeoff dataset generator
// ==========================================
// Purpose: generate CSV test datasets for the import pipeline
// Output: tests/fixtures/datasets/*.csv
// ==========================================

use csv::Writer;
use std::error::Error;
use std::fs::{create_dir_all, File};

// Takeoff sheet header
const CSV_HEADER: &[&str] = &[
    "Dwg No",
    "Type",
    "Qty",
    "Cmdty Code",
    "Size",
    "Spec",
    "Area",
    "System",
    "Test Package",
    "Description",
];

// (type cell, commodity code prefix); tag-numbered types always get qty 1
const COMPONENT_TYPES: &[(&str, &str)] = &[
    ("Valve", "VBALU"),
    ("Fitting", "ELL90"),
    ("Flange", "FLGWN"),
    ("Gasket", "GASK"),
    ("Support", "SUP"),
    ("Spool", "SPL"),
    ("Instrument", "ME"),
    ("Field Weld", "FW"),
];

const TAGGED_TYPES: &[&str] = &["Spool", "Instrument", "Field Weld"];

#[derive(Clone)]
struct TakeoffRecord {
    drawing_no: String,
    component_type: String,
    quantity: String,
    commodity_code: String,
    size: String,
    spec: String,
    area: String,
    system: String,
    test_package: String,
    description: String,
}

impl TakeoffRecord {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.drawing_no.clone(),
            self.component_type.clone(),
            self.quantity.clone(),
            self.commodity_code.clone(),
            self.size.clone(),
            self.spec.clone(),
            self.area.clone(),
            self.system.clone(),
            self.test_package.clone(),
            self.description.clone(),
        ]
    }
}

// Generate one clean takeoff row. The commodity code embeds the index, so
// every row has a distinct identity and explodes without collisions.
fn generate_normal_record(index: usize) -> TakeoffRecord {
    let (type_cell, code_prefix) = COMPONENT_TYPES[index % COMPONENT_TYPES.len()];
    let quantity = if TAGGED_TYPES.contains(&type_cell) {
        1
    } else {
        1 + (index % 5)
    };
    let size = ["2", "3", "4", "6", "1/2", "3/4"][index % 6];

    TakeoffRecord {
        drawing_no: format!("P-{:03}", (index / 8) + 1),
        component_type: type_cell.to_string(),
        quantity: quantity.to_string(),
        commodity_code: format!("{}-{:05}", code_prefix, index + 1),
        size: size.to_string(),
        spec: ["CS150", "CS300", "SS150"][index % 3].to_string(),
        area: format!("Unit {}", 100 * (1 + (index / 40) % 3)),
        system: ["CW-01", "SW-02", "FW-03"][(index / 10) % 3].to_string(),
        test_package: format!("TP-{:02}", (index / 20) + 1),
        description: format!("{} NPS {}", type_cell, size),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("Generating takeoff test datasets...");

    create_dir_all("tests/fixtures/datasets")?;

    // 1. Normal data (120 rows)
    generate_normal_takeoff()?;

    // 2. Large dataset (1000 rows)
    generate_large_takeoff()?;

    // 3. Duplicate identities within one batch
    generate_duplicate_identities()?;

    // 4. Tag-numbered types with quantity above one
    generate_tagged_over_quantity()?;

    // 5. Missing required fields
    generate_missing_required_fields()?;

    // 6. Invalid cell values
    generate_invalid_values()?;

    // 7. Header only, no data rows
    generate_header_only()?;

    // 8. Edge cases
    generate_edge_cases()?;

    // 9. Mixed problems in one file
    generate_mixed_issues()?;

    println!("✓ All takeoff datasets generated");
    Ok(())
}

fn generate_normal_takeoff() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/01_normal_takeoff.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(CSV_HEADER)?;

    for i in 0..120 {
        let record = generate_normal_record(i);
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ Generated 01_normal_takeoff.csv (120 rows)");
    Ok(())
}

fn generate_large_takeoff() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/02_large_takeoff.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(CSV_HEADER)?;

    for i in 0..1000 {
        let record = generate_normal_record(i + 10000); // keep identities clear of other datasets
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ Generated 02_large_takeoff.csv (1000 rows)");
    Ok(())
}

fn generate_duplicate_identities() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/03_duplicate_identities.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(CSV_HEADER)?;

    // 15 clean rows, then 5 exact repeats: same drawing, size and code
    // explode into the same component ids
    for i in 0..15 {
        let record = generate_normal_record(i + 20000);
        wtr.write_record(&record.to_row())?;
    }
    for i in [0, 3, 6, 9, 12] {
        let record = generate_normal_record(i + 20000);
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ Generated 03_duplicate_identities.csv (20 rows, 5 colliding pairs)");
    Ok(())
}

fn generate_tagged_over_quantity() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/04_tagged_over_quantity.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(CSV_HEADER)?;

    // Tag-numbered items never take a sequence suffix, so a quantity above
    // one collides with itself
    for (i, type_cell) in TAGGED_TYPES.iter().enumerate() {
        let mut record = generate_normal_record(i + 30000);
        record.component_type = type_cell.to_string();
        record.quantity = "2".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Control rows that stay importable
    for i in 0..3 {
        let mut record = generate_normal_record(i + 30010);
        record.component_type = "Valve".to_string();
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ Generated 04_tagged_over_quantity.csv (6 rows, 3 self-colliding)");
    Ok(())
}

fn generate_missing_required_fields() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/05_missing_required_fields.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(CSV_HEADER)?;

    // Blank drawing number
    for i in 0..3 {
        let mut record = generate_normal_record(i + 40000);
        record.drawing_no = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Blank component type
    for i in 0..3 {
        let mut record = generate_normal_record(i + 40003);
        record.component_type = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Blank quantity
    for i in 0..3 {
        let mut record = generate_normal_record(i + 40006);
        record.quantity = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Blank commodity code
    for i in 0..3 {
        let mut record = generate_normal_record(i + 40009);
        record.commodity_code = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ Generated 05_missing_required_fields.csv (12 rows)");
    Ok(())
}

fn generate_invalid_values() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/06_invalid_values.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(CSV_HEADER)?;

    // Unknown component type
    for i in 0..3 {
        let mut record = generate_normal_record(i + 50000);
        record.component_type = "Widget".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Non-numeric quantity
    for i in 0..2 {
        let mut record = generate_normal_record(i + 50003);
        record.quantity = "ABC".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Negative quantity
    for i in 0..2 {
        let mut record = generate_normal_record(i + 50005);
        record.quantity = "-3".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Fractional quantity
    for i in 0..2 {
        let mut record = generate_normal_record(i + 50007);
        record.quantity = "2.5".to_string();
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ Generated 06_invalid_values.csv (9 rows)");
    Ok(())
}

fn generate_header_only() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/07_header_only.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(CSV_HEADER)?;

    wtr.flush()?;
    println!("✓ Generated 07_header_only.csv (0 rows)");
    Ok(())
}

fn generate_edge_cases() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/08_edge_cases.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(CSV_HEADER)?;

    // Quantity zero: valid row, no component records
    for i in 0..2 {
        let mut record = generate_normal_record(i + 70000);
        record.quantity = "0".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Blank size collapses to the NOSIZE token
    for i in 0..2 {
        let mut record = generate_normal_record(i + 70002);
        record.size = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Quantity past the three-digit padding
    {
        let mut record = generate_normal_record(70004);
        record.component_type = "Support".to_string();
        record.quantity = "1200".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Whole-number float quantity
    {
        let mut record = generate_normal_record(70005);
        record.component_type = "Gasket".to_string();
        record.quantity = "4.0".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Optional columns empty
    for i in 0..2 {
        let mut record = generate_normal_record(i + 70006);
        record.area = "".to_string();
        record.system = "".to_string();
        record.test_package = "".to_string();
        record.spec = "".to_string();
        record.description = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Control rows
    for i in 0..2 {
        let record = generate_normal_record(i + 70008);
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ Generated 08_edge_cases.csv (10 rows)");
    Ok(())
}

fn generate_mixed_issues() -> Result<(), Box<dyn Error>> {
    let path = "tests/fixtures/datasets/09_mixed_issues.csv";
    let file = File::create(path)?;
    let mut wtr = Writer::from_writer(file);

    wtr.write_record(CSV_HEADER)?;

    // Clean rows (10)
    for i in 0..10 {
        let record = generate_normal_record(i + 80000);
        wtr.write_record(&record.to_row())?;
    }

    // Missing required fields (3)
    for i in 0..3 {
        let mut record = generate_normal_record(i + 80010);
        record.drawing_no = "".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Unknown type (3)
    for i in 0..3 {
        let mut record = generate_normal_record(i + 80013);
        record.component_type = "Widget".to_string();
        wtr.write_record(&record.to_row())?;
    }

    // Bad quantities (3)
    for i in 0..3 {
        let mut record = generate_normal_record(i + 80016);
        record.quantity = ["-1", "x", "1.5"][i].to_string();
        wtr.write_record(&record.to_row())?;
    }

    wtr.flush()?;
    println!("✓ Generated 09_mixed_issues.csv (19 rows)");
    Ok(())
}
