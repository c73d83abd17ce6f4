//! Tests for ingestion and structure inference across realistic layouts.

mod common;

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use crate::common::{build_workbook, build_workbook_shared, Val};
    use gradesheet::error::GradesheetError;
    use gradesheet::ingest::ingest;
    use gradesheet::types::CellScalar;
    use gradesheet::ScanConfig;

    // ================================================================
    // Test helpers
    // ================================================================

    /// An Arabic grade sheet with a title banner above the header row.
    fn arabic_rows() -> Vec<&'static [Val]> {
        vec![
            &[Val::S("كشف درجات الفصل الأول")],
            &[Val::Blank],
            &[
                Val::S("رقم الطالب"),
                Val::S("اسم الطالب"),
                Val::S("درجة الامتحان"),
            ],
            &[Val::N(1001.0), Val::S("سارة أحمد"), Val::N(70.0)],
            &[Val::N(1002.0), Val::S("عمر خليل"), Val::N(55.0)],
        ]
    }

    fn config() -> ScanConfig {
        ScanConfig::default()
    }

    // ================================================================
    // Header-row location + mapping
    // ================================================================

    #[test]
    fn arabic_headers_below_a_title_banner() {
        let data = build_workbook(&[("الدرجات", arabic_rows().as_slice())]);
        let ingested = ingest(&data, "grades.xlsx", &config()).unwrap();

        let sheet = &ingested.sheets[0];
        assert_eq!(sheet.name, "الدرجات");
        assert_eq!(
            sheet.headers,
            ["رقم الطالب", "اسم الطالب", "درجة الامتحان"]
        );
        // Banner and blank rows above the header are not data.
        assert_eq!(sheet.rows.len(), 2);

        let mapping = ingested.mapping.as_ref().unwrap();
        assert_eq!(mapping.identifier_column, "رقم الطالب");
        assert_eq!(mapping.name_column, "اسم الطالب");
        assert_eq!(mapping.primary_grade_column, "درجة الامتحان");
    }

    #[test]
    fn shared_string_cells_parse_like_inline_strings() {
        let inline = build_workbook(&[("الدرجات", arabic_rows().as_slice())]);
        let shared = build_workbook_shared(&[("الدرجات", arabic_rows().as_slice())]);

        let a = ingest(&inline, "a.xlsx", &config()).unwrap();
        let b = ingest(&shared, "b.xlsx", &config()).unwrap();
        assert_eq!(a.sheets[0].headers, b.sheets[0].headers);
        assert_eq!(a.sheets[0].rows.len(), b.sheets[0].rows.len());
        assert_eq!(
            a.sheets[0].rows[0].get("اسم الطالب"),
            b.sheets[0].rows[0].get("اسم الطالب")
        );
    }

    #[test]
    fn headerless_sheet_found_by_shape() {
        let rows: Vec<&[Val]> = vec![
            &[Val::N(20231001.0), Val::S("Lina Haddad"), Val::N(88.0)],
            &[Val::N(20231002.0), Val::S("Karim Nasser"), Val::N(73.0)],
        ];
        let data = build_workbook(&[("Sheet1", rows.as_slice())]);
        let ingested = ingest(&data, "grades.xlsx", &config()).unwrap();

        let sheet = &ingested.sheets[0];
        assert_eq!(sheet.headers, ["Column 1", "Column 2", "Column 3"]);
        assert_eq!(sheet.rows.len(), 2);

        // Positional fallback: first column id, second name, third grade.
        let mapping = ingested.mapping.as_ref().unwrap();
        assert_eq!(mapping.identifier_column, "Column 1");
        assert_eq!(mapping.name_column, "Column 2");
        assert_eq!(mapping.primary_grade_column, "Column 3");
    }

    #[test]
    fn magnitude_threshold_is_honored() {
        // Ids below the default threshold of 1000 defeat the shape scan.
        let rows: Vec<&[Val]> = vec![
            &[Val::N(7.0), Val::S("Lina Haddad"), Val::N(88.0)],
            &[Val::N(8.0), Val::S("Karim Nasser"), Val::N(73.0)],
        ];
        let data = build_workbook(&[("Sheet1", rows.as_slice())]);

        let strict = ingest(&data, "grades.xlsx", &config()).unwrap();
        assert_eq!(strict.sheets[0].rows.len(), 2); // all rows kept, unfiltered

        let relaxed = ScanConfig {
            id_magnitude_threshold: 5.0,
            ..ScanConfig::default()
        };
        let found = ingest(&data, "grades.xlsx", &relaxed).unwrap();
        assert_eq!(found.sheets[0].rows.len(), 2);
        assert!(found.mapping.is_some());
    }

    #[test]
    fn rows_missing_identifier_or_name_are_skipped() {
        let rows: Vec<&[Val]> = vec![
            &[Val::S("ID"), Val::S("Name"), Val::S("Grade")],
            &[Val::N(1001.0), Val::S("Sara Ahmed"), Val::N(70.0)],
            &[Val::Blank, Val::S("No Id"), Val::N(50.0)],
            &[Val::N(1003.0), Val::Blank, Val::N(60.0)],
            &[Val::N(1004.0), Val::S("Omar Khalil"), Val::Blank],
        ];
        let data = build_workbook(&[("Sheet1", rows.as_slice())]);
        let ingested = ingest(&data, "grades.xlsx", &config()).unwrap();

        let sheet = &ingested.sheets[0];
        // Only rows with both id and name survive; a blank grade is fine.
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[1].get("Grade"), &CellScalar::Empty);
    }

    #[test]
    fn blank_header_cells_get_positional_labels() {
        let rows: Vec<&[Val]> = vec![
            &[Val::S("ID"), Val::S("Name"), Val::Blank, Val::S("Final")],
            &[Val::N(1001.0), Val::S("Sara Ahmed"), Val::N(1.0), Val::N(70.0)],
        ];
        let data = build_workbook(&[("Sheet1", rows.as_slice())]);
        let ingested = ingest(&data, "grades.xlsx", &config()).unwrap();
        assert_eq!(
            ingested.sheets[0].headers,
            ["ID", "Name", "Column 3", "Final"]
        );
    }

    // ================================================================
    // Multi-sheet behavior
    // ================================================================

    #[test]
    fn reference_mapping_comes_from_first_non_empty_sheet() {
        let empty: Vec<&[Val]> = vec![];
        let data_rows: Vec<&[Val]> = vec![
            &[Val::S("ID"), Val::S("Name"), Val::S("Final")],
            &[Val::N(1001.0), Val::S("Sara Ahmed"), Val::N(70.0)],
        ];
        let data = build_workbook(&[("Cover", empty.as_slice()), ("Term 1", data_rows.as_slice())]);
        let ingested = ingest(&data, "grades.xlsx", &config()).unwrap();

        assert_eq!(ingested.current_sheet, 1);
        assert_eq!(
            ingested.mapping.as_ref().unwrap().primary_grade_column,
            "Final"
        );
    }

    #[test]
    fn header_only_sheet_gets_its_own_mapping() {
        let data_rows: Vec<&[Val]> = vec![
            &[Val::S("ID"), Val::S("Name"), Val::S("Final")],
            &[Val::N(1001.0), Val::S("Sara Ahmed"), Val::N(70.0)],
        ];
        let header_only: Vec<&[Val]> = vec![&[
            Val::S("رقم"),
            Val::S("الاسم"),
            Val::S("الدرجة"),
        ]];
        let data = build_workbook(&[("Term 1", data_rows.as_slice()), ("Term 2", header_only.as_slice())]);
        let ingested = ingest(&data, "grades.xlsx", &config()).unwrap();

        // The empty sheet maps against its own headers, not the reference.
        let mapping = ingested.mapping_for(1).unwrap();
        assert_eq!(mapping.identifier_column, "رقم");
        assert_eq!(mapping.name_column, "الاسم");
        assert_eq!(mapping.primary_grade_column, "الدرجة");
    }

    #[test]
    fn two_column_sheet_leaves_mapping_unresolved() {
        let rows: Vec<&[Val]> = vec![
            &[Val::S("ID"), Val::S("Name")],
            &[Val::N(1001.0), Val::S("Sara Ahmed")],
        ];
        let data = build_workbook(&[("Sheet1", rows.as_slice())]);
        let ingested = ingest(&data, "grades.xlsx", &config()).unwrap();

        // No grade column can be found; the sheet stays inspectable.
        assert!(ingested.mapping.is_none());
        assert_eq!(ingested.sheets[0].rows.len(), 1);
    }

    // ================================================================
    // Rejection paths
    // ================================================================

    #[test]
    fn empty_payload_is_a_parse_error() {
        let err = ingest(&[], "grades.xlsx", &config()).unwrap_err();
        assert!(matches!(err, GradesheetError::Parse(_)));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let no_rows: Vec<&[Val]> = vec![];
        let data = build_workbook(&[("Sheet1", no_rows.as_slice())]);
        let err = ingest(&data, "grades.csv", &config()).unwrap_err();
        assert!(matches!(err, GradesheetError::Parse(_)));
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = ingest(b"not a zip archive", "grades.xlsx", &config()).unwrap_err();
        assert!(matches!(err, GradesheetError::Parse(_)));
    }
}
