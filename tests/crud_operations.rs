use sqlite_crud::demo::{school_schema, STUDENTS, SUBJECTS};
use sqlite_crud::{
    ColumnDefinition, DataType, Error, Params, Query, Result, Row, SqliteConfig, SqliteStore,
    TableDefinition, Value,
};
use tempfile::NamedTempFile;

// Helper function to create an in-memory database for testing
fn create_test_db() -> Result<SqliteStore> {
    SqliteStore::open(&SqliteConfig::new(":memory:", school_schema()))
}

// Helper function to create a temporary file-based database
fn create_temp_db() -> Result<(SqliteStore, NamedTempFile)> {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_str().unwrap().to_string();
    let store = SqliteStore::open(&SqliteConfig::new(path, school_schema()))?;
    Ok((store, temp_file))
}

fn student(first: &str, last: &str, start: i64, year: i64) -> Vec<Value> {
    vec![first.into(), last.into(), start.into(), year.into()]
}

fn seed_students(store: &SqliteStore) -> Result<Vec<i64>> {
    [
        student("Marcin", "Nowak", 2009, 3),
        student("Anna", "Nowak", 2010, 2),
        student("Piotr", "Kowalski", 2009, 3),
        student("Marcin", "Wojcik", 2011, 1),
    ]
    .iter()
    .map(|values| store.insert(STUDENTS, values))
    .collect()
}

#[test]
fn test_student_walkthrough() {
    test_student_walkthrough_impl().unwrap();
}

fn test_student_walkthrough_impl() -> Result<()> {
    let store = create_test_db()?;

    let id = store.insert(STUDENTS, &student("Marcin", "Nowak", 2009, 3))?;
    assert_eq!(id, 1);

    let by_id = Query::new().with_condition("id", id);
    let expected: Row = vec![
        Value::Integer(1),
        Value::from("Marcin"),
        Value::from("Nowak"),
        Value::Integer(2009),
        Value::Integer(3),
    ];
    assert_eq!(store.select_where(STUDENTS, &by_id)?, vec![expected]);

    let changed = store.update(STUDENTS, id, &Params::new().with_value("study_year", 2))?;
    assert_eq!(changed, 1);
    let expected: Row = vec![
        Value::Integer(1),
        Value::from("Marcin"),
        Value::from("Nowak"),
        Value::Integer(2009),
        Value::Integer(2),
    ];
    assert_eq!(store.select_where(STUDENTS, &by_id)?, vec![expected]);

    let removed =
        store.delete_where(STUDENTS, &Query::new().with_condition("first_name", "Marcin"))?;
    assert_eq!(removed, 1);
    assert!(store.select_where(STUDENTS, &by_id)?.is_empty());

    Ok(())
}

#[test]
fn test_insert_then_select_all() {
    let store = create_test_db().unwrap();
    let ids = seed_students(&store).unwrap();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    let rows = store.select_all(STUDENTS).unwrap();
    assert_eq!(rows.len(), 4);
    let anna = rows
        .iter()
        .find(|row| row[0] == Value::Integer(ids[1]))
        .unwrap();
    assert_eq!(&anna[1..], student("Anna", "Nowak", 2010, 2).as_slice());
}

fn seed_subjects(store: &SqliteStore, student_id: i64) -> Result<Vec<i64>> {
    let subject = |name: &str, description: Option<&str>, category: &str, hours: i64| {
        vec![
            Value::Integer(student_id),
            name.into(),
            description.into(),
            category.into(),
            hours.into(),
            Value::Integer(2009),
        ]
    };
    [
        subject("Mathematics", Some("Linear algebra"), "science", 60),
        subject("History", None, "humanities", 30),
        subject("Physics", Some("Mechanics"), "science", 45),
        subject("Latin", None, "humanities", 30),
    ]
    .iter()
    .map(|values| store.insert(SUBJECTS, values))
    .collect()
}

// For every column and every value present in it, select_where must return
// exactly the select_all rows holding that value.
fn assert_filters_match_select_all(store: &SqliteStore, table: &str) {
    let all = store.select_all(table).unwrap();
    let columns = store.columns(table).unwrap();
    assert!(!all.is_empty());

    for (i, column) in columns.iter().enumerate() {
        for row in &all {
            let value = row[i].clone();
            let expected: Vec<Row> = all.iter().filter(|r| r[i] == value).cloned().collect();
            let got = store
                .select_where(table, &Query::new().with_condition(column, value.clone()))
                .unwrap();
            assert_eq!(got, expected, "filter {table}.{column} = {value:?}");
        }
    }
}

#[test]
fn test_select_where_matches_filtered_select_all() {
    let store = create_test_db().unwrap();
    let ids = seed_students(&store).unwrap();
    seed_subjects(&store, ids[0]).unwrap();

    assert_filters_match_select_all(&store, STUDENTS);
    assert_filters_match_select_all(&store, SUBJECTS);
}

#[test]
fn test_null_filter_matches_null_columns() {
    let store = create_test_db().unwrap();
    let ids = seed_students(&store).unwrap();
    seed_subjects(&store, ids[0]).unwrap();

    let no_description = Query::new().with_condition("description", Value::Null);
    let rows = store.select_where(SUBJECTS, &no_description).unwrap();
    let names: Vec<&Value> = rows.iter().map(|row| &row[2]).collect();
    assert_eq!(names, vec![&Value::from("History"), &Value::from("Latin")]);

    assert_eq!(store.delete_where(SUBJECTS, &no_description).unwrap(), 2);
    assert!(store.select_where(SUBJECTS, &no_description).unwrap().is_empty());
    assert_eq!(store.select_all(SUBJECTS).unwrap().len(), 2);
}

#[test]
fn test_update_can_set_null() {
    let store = create_test_db().unwrap();
    let ids = seed_students(&store).unwrap();
    let subject_ids = seed_subjects(&store, ids[0]).unwrap();

    store
        .update(
            SUBJECTS,
            subject_ids[0],
            &Params::new().with_value("description", Value::Null),
        )
        .unwrap();
    let rows = store
        .select_where(SUBJECTS, &Query::new().with_condition("id", subject_ids[0]))
        .unwrap();
    assert_eq!(rows[0][3], Value::Null);
}

#[test]
fn test_column_names_match_case_insensitively() {
    let store = create_test_db().unwrap();
    let ids = seed_students(&store).unwrap();

    let rows = store
        .select_where("STUDENTS", &Query::new().with_condition("ID", ids[1]))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], Value::from("Anna"));

    store
        .update(STUDENTS, ids[1], &Params::new().with_value("Study_Year", 3))
        .unwrap();
    let rows = store
        .select_where(STUDENTS, &Query::new().with_condition("id", ids[1]))
        .unwrap();
    assert_eq!(rows[0][4], Value::Integer(3));

    assert_eq!(
        store
            .delete_where(STUDENTS, &Query::new().with_condition("LAST_NAME", "Nowak"))
            .unwrap(),
        2
    );
}

#[test]
fn test_conjunctive_filter() {
    let store = create_test_db().unwrap();
    seed_students(&store).unwrap();

    let rows = store
        .select_where(
            STUDENTS,
            &Query::new()
                .with_condition("start_year", 2009)
                .with_condition("study_year", 3)
                .with_condition("last_name", "Kowalski"),
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], Value::from("Piotr"));
}

#[test]
fn test_update_leaves_other_fields_unchanged() {
    let store = create_test_db().unwrap();
    let ids = seed_students(&store).unwrap();
    let before = store.select_all(STUDENTS).unwrap();

    store
        .update(
            STUDENTS,
            ids[2],
            &Params::new()
                .with_value("last_name", "Zielinski")
                .with_value("study_year", 4),
        )
        .unwrap();

    let after = store.select_all(STUDENTS).unwrap();
    for (old, new) in before.iter().zip(&after) {
        if old[0] == Value::Integer(ids[2]) {
            assert_eq!(new[1], old[1]);
            assert_eq!(new[2], Value::from("Zielinski"));
            assert_eq!(new[3], old[3]);
            assert_eq!(new[4], Value::Integer(4));
        } else {
            assert_eq!(new, old);
        }
    }
}

#[test]
fn test_update_missing_id_changes_nothing() {
    let store = create_test_db().unwrap();
    seed_students(&store).unwrap();
    let changed = store
        .update(STUDENTS, 999, &Params::new().with_value("study_year", 5))
        .unwrap();
    assert_eq!(changed, 0);
}

#[test]
fn test_delete_where_removes_exact_matches() {
    let store = create_test_db().unwrap();
    seed_students(&store).unwrap();

    let filter = Query::new().with_condition("last_name", "Nowak");
    assert_eq!(store.delete_where(STUDENTS, &filter).unwrap(), 2);
    assert!(store.select_where(STUDENTS, &filter).unwrap().is_empty());

    let remaining: Vec<Value> = store
        .select_all(STUDENTS)
        .unwrap()
        .into_iter()
        .map(|row| row[1].clone())
        .collect();
    assert_eq!(remaining, vec![Value::from("Piotr"), Value::from("Marcin")]);
}

#[test]
fn test_delete_all() {
    let store = create_test_db().unwrap();
    seed_students(&store).unwrap();
    assert_eq!(store.delete_all(STUDENTS).unwrap(), 4);
    assert!(store.select_all(STUDENTS).unwrap().is_empty());
}

#[test]
fn test_empty_filter_and_update_are_rejected() {
    let store = create_test_db().unwrap();
    seed_students(&store).unwrap();

    assert!(matches!(
        store.select_where(STUDENTS, &Query::new()),
        Err(Error::EmptyFilter(t)) if t == STUDENTS
    ));
    assert!(matches!(
        store.delete_where(STUDENTS, &Query::new()),
        Err(Error::EmptyFilter(_))
    ));
    assert!(matches!(
        store.update(STUDENTS, 1, &Params::new()),
        Err(Error::EmptyUpdate(_))
    ));
    assert_eq!(store.select_all(STUDENTS).unwrap().len(), 4);
}

#[test]
fn test_unknown_names_are_rejected_before_execution() {
    let store = create_test_db().unwrap();
    seed_students(&store).unwrap();

    assert!(matches!(
        store.select_all("students; DROP TABLE students"),
        Err(Error::UnknownTable(_))
    ));
    assert!(matches!(
        store.delete_all("teachers"),
        Err(Error::UnknownTable(t)) if t == "teachers"
    ));

    let hostile = Query::new().with_condition("1=1 OR first_name", "x");
    assert!(matches!(
        store.delete_where(STUDENTS, &hostile),
        Err(Error::UnknownColumn { column, .. }) if column == "1=1 OR first_name"
    ));
    assert!(matches!(
        store.update(STUDENTS, 1, &Params::new().with_value("grade", 5)),
        Err(Error::UnknownColumn { .. })
    ));

    assert_eq!(store.select_all(STUDENTS).unwrap().len(), 4);
}

#[test]
fn test_insert_arity_mismatch() {
    let store = create_test_db().unwrap();
    let err = store
        .insert(STUDENTS, &[Value::from("Marcin"), Value::from("Nowak")])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ArityMismatch {
            expected: 4,
            actual: 2,
            ..
        }
    ));
}

#[test]
fn test_insert_named_leaves_omitted_columns_null() {
    let store = create_test_db().unwrap();
    let student_id = store.insert(STUDENTS, &student("Anna", "Nowak", 2010, 2)).unwrap();

    let subject_id = store
        .insert_named(
            SUBJECTS,
            &Params::new()
                .with_value("student_id", student_id)
                .with_value("name", "Physics")
                .with_value("hours", 45),
        )
        .unwrap();

    let rows = store
        .select_where(SUBJECTS, &Query::new().with_condition("id", subject_id))
        .unwrap();
    assert_eq!(
        rows,
        vec![vec![
            Value::Integer(subject_id),
            Value::Integer(student_id),
            Value::from("Physics"),
            Value::Null,
            Value::Null,
            Value::Integer(45),
            Value::Null,
        ]]
    );
}

#[test]
fn test_literal_schema_and_rowid_key() {
    let store = SqliteStore::open_path(":memory:").unwrap();
    store
        .execute("CREATE TABLE IF NOT EXISTS notes (body TEXT, pinned INTEGER)")
        .unwrap();
    // create-or-ignore
    store
        .execute("CREATE TABLE IF NOT EXISTS notes (body TEXT, pinned INTEGER)")
        .unwrap();

    let id = store
        .insert("notes", &[Value::from("first"), Value::Boolean(false)])
        .unwrap();
    store
        .update("notes", id, &Params::new().with_value("pinned", true))
        .unwrap();

    assert_eq!(
        store.select_all("notes").unwrap(),
        vec![vec![Value::from("first"), Value::Integer(1)]]
    );
}

#[test]
fn test_execute_reports_errors() {
    let store = create_test_db().unwrap();
    assert!(matches!(
        store.execute("CREATE TABEL broken (id INTEGER)"),
        Err(Error::Sqlite(_))
    ));
}

#[test]
fn test_create_table_from_definition() {
    let store = create_test_db().unwrap();
    store
        .create_table(
            &TableDefinition::new("grades")
                .column(ColumnDefinition::new("id", DataType::Integer).primary_key())
                .column(ColumnDefinition::new("score", DataType::Real)),
        )
        .unwrap();
    assert_eq!(store.columns("grades").unwrap(), vec!["id", "score"]);

    let id = store.insert("grades", &[Value::Real(4.5)]).unwrap();
    assert_eq!(
        store.select_all("grades").unwrap(),
        vec![vec![Value::Integer(id), Value::Real(4.5)]]
    );
}

#[test]
fn test_foreign_keys_follow_config() {
    let orphan = [
        Value::Integer(42),
        Value::from("Chemistry"),
        Value::Null,
        Value::from("science"),
        Value::Integer(30),
        Value::Integer(2010),
    ];

    let lax = create_test_db().unwrap();
    assert!(lax.insert(SUBJECTS, &orphan).is_ok());

    let strict = SqliteStore::open(
        &SqliteConfig::new(":memory:", school_schema()).with_foreign_keys(true),
    )
    .unwrap();
    assert!(matches!(
        strict.insert(SUBJECTS, &orphan),
        Err(Error::Sqlite(_))
    ));
}

#[test]
fn test_file_database_persists_across_reopen() {
    test_file_database_persists_across_reopen_impl().unwrap();
}

fn test_file_database_persists_across_reopen_impl() -> Result<()> {
    let (store, temp_file) = create_temp_db()?;
    let id = store.insert(STUDENTS, &student("Piotr", "Kowalski", 2009, 3))?;
    store.close()?;

    let path = temp_file.path().to_str().unwrap().to_string();
    let reopened = SqliteStore::open(&SqliteConfig::new(path, school_schema()))?;
    let rows = reopened.select_where(STUDENTS, &Query::new().with_condition("id", id))?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], Value::from("Piotr"));
    reopened.close()?;

    Ok(())
}

#[test]
fn test_config_from_json() {
    let config = SqliteConfig::from_json_str(
        r#"{
            "db_path": ":memory:",
            "foreign_keys": true,
            "schema": {
                "tables": [{
                    "name": "projects",
                    "columns": [
                        { "name": "id", "data_type": "Integer", "constraints": ["PrimaryKey"] },
                        { "name": "name", "data_type": "Text", "constraints": ["NotNull"] },
                        { "name": "begin_date", "data_type": "Text" }
                    ]
                }]
            }
        }"#,
    )
    .unwrap();
    assert!(config.foreign_keys);

    let store = SqliteStore::open(&config).unwrap();
    assert_eq!(
        store.columns("projects").unwrap(),
        vec!["id", "name", "begin_date"]
    );
    let id = store
        .insert("projects", &[Value::from("Cool App"), Value::from("2015-01-01")])
        .unwrap();
    assert_eq!(id, 1);
}

#[test]
fn test_config_rejects_malformed_json() {
    assert!(matches!(
        SqliteConfig::from_json_str("{ \"schema\": {} }"),
        Err(Error::Config(_))
    ));
}
