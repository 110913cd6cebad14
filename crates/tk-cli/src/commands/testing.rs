//! Sample data with fixed IDs and timestamps for command tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tk_core::repository::{ProjectRepository, TaskRepository, UserRepository};
use tk_core::timer::{start_timer_at, stop_timer_at};
use tk_core::{Project, Task, TaskId, TaskStatus, User, UserId};
use tk_db::Database;

/// Monday 2025-03-10 09:00 UTC.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

pub fn id<T: TryFrom<String>>(value: &str) -> T
where
    T::Error: std::fmt::Debug,
{
    T::try_from(value.to_string()).unwrap()
}

fn project(key: &str, title: &str, description: &str, minutes: i64) -> Project {
    let created = t0() + Duration::minutes(minutes);
    Project {
        id: id(key),
        title: title.to_string(),
        description: description.to_string(),
        owner_id: id("u-alice"),
        created_at: created,
        updated_at: created,
    }
}

fn task(
    key: &str,
    project: &str,
    title: &str,
    status: TaskStatus,
    estimated_time: Option<i64>,
    minutes: i64,
) -> Task {
    let created = t0() + Duration::minutes(minutes);
    Task {
        id: id(key),
        title: title.to_string(),
        description: String::new(),
        status,
        estimated_time,
        spent_time: 0,
        project_id: id(project),
        created_at: created,
        updated_at: created,
    }
}

/// Alice with "Website" (Copy, Images) and "Backend" (Deploy), and one
/// finished 45 minute session on Copy.
pub fn sample_db() -> (Database, User) {
    let db = Database::open_in_memory().unwrap();
    let alice = User {
        id: UserId::new("u-alice").unwrap(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        first_name: "Alice".to_string(),
        last_name: String::new(),
        created_at: t0(),
    };
    db.insert_user(&alice).unwrap();

    db.insert_project(&project("p-web", "Website", "Marketing site", 0))
        .unwrap();
    db.insert_project(&project("p-api", "Backend", "", 60))
        .unwrap();

    db.insert_task(&task("t-copy", "p-web", "Copy", TaskStatus::Todo, Some(120), 1))
        .unwrap();
    db.insert_task(&task(
        "t-images",
        "p-web",
        "Images",
        TaskStatus::InProgress,
        None,
        2,
    ))
    .unwrap();
    db.insert_task(&task(
        "t-deploy",
        "p-api",
        "Deploy",
        TaskStatus::Done,
        Some(360),
        3,
    ))
    .unwrap();

    let copy: TaskId = id("t-copy");
    start_timer_at(&db, &alice.id, &copy, t0()).unwrap();
    stop_timer_at(&db, &alice.id, &copy, t0() + Duration::minutes(45)).unwrap();

    (db, alice)
}
