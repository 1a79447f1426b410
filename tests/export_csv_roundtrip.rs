mod test_support;

use serde_json::json;
use std::collections::BTreeMap;
use test_support::{parse_csv, request_ok, spawn_sidecar, str_field, temp_dir};

const HEADER: [&str; 6] = ["ID", "Nama", "Kelas", "Tanggal", "Absensi", "Nilai"];

#[test]
fn csv_export_round_trips_two_classes_of_three() {
    let workspace = temp_dir("rollbook-csv-roundtrip");
    let out = workspace.join("rekap.csv");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Created out of order so the export has to sort.
    let mut class_ids = BTreeMap::new();
    for name in ["VII B", "VII A"] {
        let c = request_ok(
            &mut stdin,
            &mut reader,
            name,
            "classes.create",
            json!({ "name": name }),
        );
        class_ids.insert(name, str_field(&c, &["classId"]));
    }

    let roster = [
        ("VII B", "Eka"),
        ("VII A", "Citra"),
        ("VII B", "Dedi \"Dd\""),
        ("VII A", "Ani"),
        ("VII B", "Fajar, Jr"),
        ("VII A", "Budi"),
    ];
    let mut sid = BTreeMap::new();
    for (i, (class, name)) in roster.iter().enumerate() {
        let s = request_ok(
            &mut stdin,
            &mut reader,
            &format!("st{}", i),
            "students.create",
            json!({ "name": name, "classId": class_ids[class] }),
        );
        sid.insert(*name, str_field(&s, &["student", "id"]));
    }

    let d1 = "2024-07-10";
    let d2 = "2024-07-11";
    let marks = [
        (d1, "Ani", "H"),
        (d2, "Ani", "S"),
        (d1, "Budi", "A"),
        (d1, "Eka", "I"),
        (d2, "Eka", "H"),
        // Overwrite keeps only the last status.
        (d2, "Eka", "A"),
        (d2, "Fajar, Jr", "H"),
    ];
    for (i, (date, name, status)) in marks.iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("att{}", i),
            "attendance.set",
            json!({ "date": date, "studentId": sid[name], "status": status }),
        );
    }

    let grades = [
        (d1, "Ani", 80.0),
        (d1, "Ani", 91.0),
        (d2, "Ani", 70.0),
        (d2, "Budi", 66.5),
        (d1, "Dedi \"Dd\"", 100.0),
        (d2, "Eka", 77.0),
    ];
    for (i, (date, name, score)) in grades.iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("gr{}", i),
            "grades.add",
            json!({ "date": date, "studentId": sid[name], "score": score }),
        );
    }

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "csv",
        "exports.csv",
        json!({ "date": d2, "outPath": out.to_string_lossy() }),
    );
    assert_eq!(res["filename"], format!("absensi_nilai_{}_all.csv", d2));
    let content = res["content"].as_str().expect("content").to_string();
    assert_eq!(std::fs::read_to_string(&out).expect("written file"), content);
    assert!(!content.ends_with('\n'));

    let parsed = parse_csv(&content);
    assert_eq!(parsed[0], HEADER);
    let rows: Vec<Vec<String>> = parsed[1..].to_vec();

    let expected: Vec<[&str; 5]> = vec![
        // VII A: Ani, Budi, Citra
        ["Ani", "VII A", d1, "H", "85.50"],
        ["Ani", "VII A", d2, "S", "70.00"],
        ["Budi", "VII A", d1, "A", ""],
        ["Budi", "VII A", d2, "", "66.50"],
        ["Citra", "VII A", "", "", ""],
        // VII B: Dedi, Eka, Fajar
        ["Dedi \"Dd\"", "VII B", d1, "", "100.00"],
        ["Eka", "VII B", d1, "I", ""],
        ["Eka", "VII B", d2, "A", "77.00"],
        ["Fajar, Jr", "VII B", d2, "H", ""],
    ];
    // (student, date) unions plus one placeholder row for Citra.
    assert_eq!(rows.len(), expected.len());
    assert_eq!(res["rowCount"], expected.len());
    for (row, exp) in rows.iter().zip(&expected) {
        assert_eq!(row.len(), 6);
        assert_eq!(row[0], sid[exp[0]]);
        assert_eq!(row[1], exp[0]);
        assert_eq!(row[2], exp[1]);
        assert_eq!(row[3], exp[2]);
        assert_eq!(row[4], exp[3]);
        assert_eq!(row[5], exp[4]);
    }

    let only_b = request_ok(
        &mut stdin,
        &mut reader,
        "csv-b",
        "exports.csv",
        json!({ "date": d2, "classId": class_ids["VII B"] }),
    );
    assert_eq!(
        only_b["filename"],
        format!("absensi_nilai_{}_{}.csv", d2, class_ids["VII B"])
    );
    assert_eq!(only_b["rowCount"], 4);
}

#[test]
fn empty_workspace_exports_header_only_documents() {
    let workspace = temp_dir("rollbook-empty-export");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let csv = request_ok(
        &mut stdin,
        &mut reader,
        "csv",
        "exports.csv",
        json!({ "date": "2024-07-10" }),
    );
    assert_eq!(
        csv["content"],
        "\"ID\",\"Nama\",\"Kelas\",\"Tanggal\",\"Absensi\",\"Nilai\""
    );

    let xls = request_ok(
        &mut stdin,
        &mut reader,
        "xls",
        "exports.spreadsheet",
        json!({ "date": "2024-07-10" }),
    );
    assert_eq!(xls["filename"], "absensi_nilai_2024-07-10_all.xls");
    let html = xls["content"].as_str().expect("content");
    assert!(html.contains("<table>"));
    assert!(html.contains("<th>Nilai</th>"));
    assert!(!html.contains("<td>"));

    let sheet = request_ok(
        &mut stdin,
        &mut reader,
        "sheet",
        "exports.attendanceCsv",
        json!({ "date": "2024-07-10" }),
    );
    assert_eq!(sheet["filename"], "absensi_2024-07-10_all.csv");
    assert_eq!(sheet["rowCount"], 0);

    let ledger = request_ok(&mut stdin, &mut reader, "ledger", "exports.gradesCsv", json!({}));
    assert_eq!(ledger["filename"], "nilai_all.csv");
    assert_eq!(
        ledger["content"],
        "\"Tanggal\",\"Kelas\",\"ID Siswa\",\"Nama Siswa\",\"Nilai\""
    );
}

#[test]
fn markup_exports_escape_names_and_share_rows() {
    let workspace = temp_dir("rollbook-markup-export");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = request_ok(
        &mut stdin,
        &mut reader,
        "st",
        "students.create",
        json!({ "name": "<b>Tom & Jerry</b>" }),
    );
    let student_id = str_field(&s, &["student", "id"]);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "gr",
        "grades.add",
        json!({ "date": "2024-07-10", "studentId": student_id, "score": "88" }),
    );

    let xls = request_ok(
        &mut stdin,
        &mut reader,
        "xls",
        "exports.spreadsheet",
        json!({ "date": "2024-07-10" }),
    );
    let html = xls["content"].as_str().expect("content");
    assert!(html.contains("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"));
    assert!(!html.contains("<b>"));
    assert!(html.contains("<td>88.00</td>"));
    assert!(html.contains("<td>-</td>"));

    let print = request_ok(
        &mut stdin,
        &mut reader,
        "print",
        "exports.print",
        json!({ "date": "2024-07-10" }),
    );
    let doc = print["content"].as_str().expect("content");
    assert!(doc.starts_with("<!DOCTYPE html>"));
    assert!(doc.contains("Rekap Absensi &amp; Nilai"));
    assert!(doc.contains("<td>88.00</td>"));
    assert_eq!(print["rowCount"], xls["rowCount"]);
}
