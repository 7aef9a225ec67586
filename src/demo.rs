//! The students/subjects schema and the walkthrough the demo binary runs.

use tracing::info;

use crate::error::Result;
use crate::query::{Params, Query};
use crate::schema::{
    ColumnDefinition, DataType, ForeignKey, IndexDefinition, Schema, TableDefinition,
};
use crate::sqlite::SqliteStore;
use crate::value::{Row, Value};

pub const STUDENTS: &str = "students";
pub const SUBJECTS: &str = "subjects";

/// Parent table `students` and dependent table `subjects`.
pub fn school_schema() -> Schema {
    Schema::new()
        .add_table(
            TableDefinition::new(STUDENTS)
                .column(ColumnDefinition::new("id", DataType::Integer).primary_key())
                .column(ColumnDefinition::new("first_name", DataType::Text).not_null())
                .column(ColumnDefinition::new("last_name", DataType::Text).not_null())
                .column(ColumnDefinition::new("start_year", DataType::Integer))
                .column(ColumnDefinition::new("study_year", DataType::Integer)),
        )
        .add_table(
            TableDefinition::new(SUBJECTS)
                .column(ColumnDefinition::new("id", DataType::Integer).primary_key())
                .column(ColumnDefinition::new("student_id", DataType::Integer).not_null())
                .column(ColumnDefinition::new("name", DataType::Text).not_null())
                .column(ColumnDefinition::new("description", DataType::Text))
                .column(ColumnDefinition::new("category", DataType::Text))
                .column(ColumnDefinition::new("hours", DataType::Integer))
                .column(ColumnDefinition::new("year", DataType::Integer))
                .foreign_key(ForeignKey::new("student_id", STUDENTS, "id"))
                .index(IndexDefinition::new("idx_subjects_student_id", &["student_id"])),
        )
}

/// One line of demo output: a label and the rows it produced.
pub type Step = (String, Vec<Row>);

/// Insert, select, update and delete against the school schema. With
/// `keep == false` both tables are emptied at the end.
pub fn run(store: &SqliteStore, keep: bool) -> Result<Vec<Step>> {
    let mut steps = Vec::new();

    let student_id = store.insert(
        STUDENTS,
        &[Value::from("Marcin"), Value::from("Nowak"), Value::from(2009), Value::from(3)],
    )?;
    info!(student_id, "inserted student");
    store.insert(
        SUBJECTS,
        &[
            Value::from(student_id),
            Value::from("Mathematics"),
            Value::from("Linear algebra and calculus"),
            Value::from("science"),
            Value::from(60),
            Value::from(2009),
        ],
    )?;
    store.insert(
        SUBJECTS,
        &[
            Value::from(student_id),
            Value::from("History"),
            Value::Null,
            Value::from("humanities"),
            Value::from(30),
            Value::from(2009),
        ],
    )?;

    let by_id = Query::new().with_condition("id", student_id);
    steps.push(("students".to_string(), store.select_all(STUDENTS)?));
    steps.push((
        format!("subjects of student {student_id}"),
        store.select_where(SUBJECTS, &Query::new().with_condition("student_id", student_id))?,
    ));

    store.update(STUDENTS, student_id, &Params::new().with_value("study_year", 2))?;
    steps.push((
        format!("student {student_id} after update"),
        store.select_where(STUDENTS, &by_id)?,
    ));

    let removed = store.delete_where(SUBJECTS, &Query::new().with_condition("name", "History"))?;
    info!(removed, "deleted subjects");
    steps.push(("subjects after delete".to_string(), store.select_all(SUBJECTS)?));

    if !keep {
        store.delete_all(SUBJECTS)?;
        store.delete_all(STUDENTS)?;
        steps.push(("students after cleanup".to_string(), store.select_all(STUDENTS)?));
    }

    Ok(steps)
}
