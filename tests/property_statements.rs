// tests/property_statements.rs

use proptest::prelude::*;

use csv_collector::config::SourceSpec;
use csv_collector::sql::{create_table_statement, insert_statement, PLACEHOLDER};
use csv_collector_test_utils::builders::{ColumnBuilder, SourceSpecBuilder};

// Sources with 1..8 columns; roughly a third carry a formatter.
fn source_strategy() -> impl Strategy<Value = SourceSpec> {
    proptest::collection::vec((0usize..16, any::<bool>(), 0u8..3), 1..8).prop_map(|cols| {
        let mut builder = SourceSpecBuilder::file("generated", "/data/generated.csv");
        for (i, (index, wide, fmt)) in cols.into_iter().enumerate() {
            let sql_type = if wide { "VARCHAR(255)" } else { "INT" };
            let mut column = ColumnBuilder::new(index, &format!("col_{i}"), sql_type);
            if fmt == 0 {
                column = column.formatter("TRIM(?)");
            }
            builder = builder.column_spec(column.build());
        }
        builder.build()
    })
}

proptest! {
    #[test]
    fn insert_has_one_tuple_per_row(source in source_strategy(), rows in 1usize..50) {
        let sql = insert_statement(&source, rows).unwrap();
        let (_, values) = sql.split_once(" VALUES ").unwrap();

        prop_assert_eq!(values.matches("),(").count() + 1, rows);
        prop_assert!(!values.ends_with(','));
    }

    #[test]
    fn insert_binds_rows_times_columns(source in source_strategy(), rows in 1usize..50) {
        let sql = insert_statement(&source, rows).unwrap();
        let (_, values) = sql.split_once(" VALUES ").unwrap();

        prop_assert_eq!(values.matches(PLACEHOLDER).count(), rows * source.column_count());
    }

    #[test]
    fn create_and_insert_agree_on_column_order(source in source_strategy()) {
        let create = create_table_statement(&source);
        let insert = insert_statement(&source, 1).unwrap();

        let defs = create
            .strip_prefix("CREATE TABLE generated (")
            .and_then(|s| s.strip_suffix(')'))
            .unwrap();
        let created: Vec<&str> = defs
            .split(", ")
            .map(|def| def.split_whitespace().next().unwrap())
            .collect();

        let names = insert
            .strip_prefix("INSERT IGNORE INTO generated (")
            .and_then(|s| s.split_once(") VALUES "))
            .map(|(names, _)| names)
            .unwrap();
        let inserted: Vec<&str> = names.split(',').collect();

        prop_assert_eq!(created, inserted);
    }
}
