use serde::{Deserialize, Serialize};

use crate::error::HievError;

/// Filename prefix of the user list HIEv exports on a schedule.
pub const USER_LIST_PREFIX: &str = "HIEv_User_List_";

/// One row of the HIEv user list export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
}

/// Finds `user_id` in the text of a user list export.
///
/// Rows are `id,email,firstname,lastname` with no quoting, so a value holding a
/// comma cannot be represented; such rows are reported as malformed.
pub fn parse_user_details(text: &str, user_id: u64) -> Result<UserDetails, HievError> {
    let prefix = format!("{},", user_id);
    let line = text
        .lines()
        .find(|line| line.starts_with(&prefix))
        .ok_or(HievError::UserNotFound { user_id })?;

    let columns: Vec<&str> = line.split(',').collect();
    match columns.as_slice() {
        [id, email, firstname, lastname] => Ok(UserDetails {
            id: id.to_string(),
            email: email.to_string(),
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
        }),
        _ => Err(HievError::MalformedUserLine {
            line: line.to_string(),
        }),
    }
}
