//! `tk user create`.

use anyhow::Result;
use tk_core::User;
use tk_core::users::{NewUser, create_user};
use tk_db::Database;

use super::util::to_json;

/// Format a newly registered user.
pub fn format_created(user: &User) -> String {
    format!("Created user {} ({})\n", user.username, user.id)
}

/// Registers a user and prints it.
pub fn create(db: &mut Database, input: &NewUser, json: bool) -> Result<()> {
    let user = create_user(db, input)?;
    if json {
        println!("{}", to_json(&user)?);
    } else {
        print!("{}", format_created(&user));
    }
    Ok(())
}
