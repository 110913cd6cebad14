//! `tk project` subcommands: create, edit, delete and list.

use std::fmt::Write;

use anyhow::Result;
use tk_core::projects::{
    NewProject, ProjectChanges, ProjectQuery, create_project, delete_project, edit_project,
    list_projects,
};
use tk_core::{Project, ProjectId, ProjectWithStats, TaskStatus, User, ValidationError};
use tk_db::Database;

use super::util::{Deleted, format_minutes, parse_day, to_json, truncate};

const TITLE_WIDTH: usize = 24;

/// Builds a listing query from raw command-line values.
pub fn build_query(
    search: Option<String>,
    status: Option<TaskStatus>,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<ProjectQuery, ValidationError> {
    Ok(ProjectQuery {
        search,
        status,
        start_date: start_date
            .map(|value| parse_day(value, "start_date"))
            .transpose()?,
        end_date: end_date
            .map(|value| parse_day(value, "end_date"))
            .transpose()?,
    })
}

/// One-line confirmation for a created or updated project.
pub fn format_saved(verb: &str, project: &Project) -> String {
    format!("{verb} project {} ({})\n", project.title, project.id)
}

/// Format projects as a table.
pub fn format_project_table(projects: &[ProjectWithStats]) -> String {
    let mut output = String::new();

    if projects.is_empty() {
        writeln!(output, "No projects found.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<TITLE_WIDTH$}  {:>5}  {:>5}  {:>9}  {:>8}  ID",
        "TITLE", "TASKS", "DONE", "ESTIMATED", "SPENT"
    )
    .unwrap();
    for row in projects {
        writeln!(
            output,
            "{:<TITLE_WIDTH$}  {:>5}  {:>5}  {:>9}  {:>8}  {}",
            truncate(&row.project.title, TITLE_WIDTH),
            row.total_tasks,
            row.completed_tasks,
            format_minutes(row.total_estimated_time),
            format_minutes(row.total_spent_time),
            row.project.id
        )
        .unwrap();
    }

    output
}

fn print_saved(verb: &str, project: &Project, json: bool) -> Result<()> {
    if json {
        println!("{}", to_json(project)?);
    } else {
        print!("{}", format_saved(verb, project));
    }
    Ok(())
}

pub fn create(db: &mut Database, me: &User, input: &NewProject, json: bool) -> Result<()> {
    let project = create_project(db, &me.id, input)?;
    print_saved("Created", &project, json)
}

pub fn edit(
    db: &mut Database,
    me: &User,
    id: &str,
    changes: &ProjectChanges,
    json: bool,
) -> Result<()> {
    let id = ProjectId::new(id)?;
    let project = edit_project(db, &me.id, &id, changes)?;
    print_saved("Updated", &project, json)
}

pub fn delete(db: &mut Database, me: &User, id: &str, json: bool) -> Result<()> {
    let id = ProjectId::new(id)?;
    let project = delete_project(db, &me.id, &id)?;
    if json {
        println!(
            "{}",
            to_json(&Deleted {
                deleted: project.id.as_str()
            })?
        );
    } else {
        print!("{}", format_saved("Deleted", &project));
    }
    Ok(())
}

pub fn list(db: &Database, me: &User, query: ProjectQuery, json: bool) -> Result<()> {
    let projects = list_projects(db, &me.id, query)?;
    if json {
        println!("{}", to_json(&projects)?);
    } else {
        print!("{}", format_project_table(&projects));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use tk_core::Error;

    use crate::commands::testing::sample_db;

    #[test]
    fn test_project_table() {
        let (db, alice) = sample_db();
        let projects = list_projects(&db, &alice.id, ProjectQuery::default()).unwrap();

        assert_snapshot!(format_project_table(&projects), @r"
        TITLE                     TASKS   DONE  ESTIMATED     SPENT  ID
        Backend                       1      1      6h 0m        0m  p-api
        Website                       2      0      2h 0m       45m  p-web
        ");
    }

    #[test]
    fn test_project_table_empty() {
        assert_eq!(format_project_table(&[]), "No projects found.\n");
    }

    #[test]
    fn test_project_listing_filters() {
        let (db, alice) = sample_db();

        let query = build_query(Some("marketing".to_string()), None, None, None).unwrap();
        let found = list_projects(&db, &alice.id, query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].project.title, "Website");

        let query = build_query(None, Some(TaskStatus::Done), None, None).unwrap();
        let found = list_projects(&db, &alice.id, query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].project.title, "Backend");

        let query = build_query(None, None, Some("2025-03-11"), None).unwrap();
        assert!(list_projects(&db, &alice.id, query).unwrap().is_empty());
    }

    #[test]
    fn test_build_query_rejects_bad_dates() {
        let err = build_query(None, None, Some("March 10"), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid format of start_date. Use YYYY-MM-DD"
        );

        let (db, alice) = sample_db();
        let query = build_query(None, None, Some("2025-03-12"), Some("2025-03-10")).unwrap();
        let err = list_projects(&db, &alice.id, query).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_edit_and_delete() {
        let (mut db, alice) = sample_db();

        let changes = ProjectChanges {
            title: Some("Landing page".to_string()),
            description: None,
        };
        edit(&mut db, &alice, "p-web", &changes, false).unwrap();
        let projects = list_projects(&db, &alice.id, ProjectQuery::default()).unwrap();
        assert_eq!(projects[1].project.title, "Landing page");
        assert_eq!(projects[1].project.description, "Marketing site");

        delete(&mut db, &alice, "p-api", true).unwrap();
        let err = delete(&mut db, &alice, "p-api", false).unwrap_err();
        assert_eq!(err.to_string(), "Project not found: p-api");
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotFound { .. })));
    }

    #[test]
    fn test_format_saved() {
        let (db, alice) = sample_db();
        let projects = list_projects(&db, &alice.id, ProjectQuery::default()).unwrap();
        assert_eq!(
            format_saved("Created", &projects[1].project),
            "Created project Website (p-web)\n"
        );
    }
}
