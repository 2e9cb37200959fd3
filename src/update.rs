use crate::search::{list_setters, string_setters};

/// Metadata applied by `POST data_files/api_update`.
///
/// The same payload is sent once per target file. Only fields that were set
/// are transmitted; leaving a field `None` leaves it untouched on the server.
///
/// ```
/// use hiev::UpdateRequest;
///
/// let update = UpdateRequest::new()
///     .description("this has been updated using the API")
///     .access("Public");
/// assert!(update.title.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    pub name: Option<String>,
    pub experiment_id: Option<String>,
    pub description: Option<String>,
    pub tag_names: Option<String>,
    pub parent_filenames: Option<Vec<String>>,
    pub label_names: Option<String>,
    pub creator_email: Option<String>,
    pub contributors_names: Option<Vec<String>>,
    pub title: Option<String>,
    pub grant_numbers: Option<String>,
    pub related_websites: Option<String>,
    pub access_rights_types: Option<String>,
    pub license: Option<String>,
    pub access: Option<String>,
    pub access_to_all_institutional_users: Option<bool>,
    pub access_to_user_groups: Option<bool>,
    pub access_groups: Option<Vec<String>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl UpdateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    string_setters! {
        name,
        /// Numeric id shown on the experiment page (a.k.a. `org_level2_id`).
        experiment_id,
        description,
        /// Quoted, comma separated tag names, e.g. `"\"Gap-Filled\",\"Photo\""`.
        tag_names,
        /// Quoted, comma separated label names.
        label_names,
        /// Must belong to an approved HIEv user.
        creator_email,
        /// Package title.
        title,
        grant_numbers,
        related_websites,
        /// `Open`, `Conditional` or `Restricted`.
        access_rights_types,
        /// e.g. `CC-BY`, `CC-BY-NC-SA`, `All rights reserved`.
        license,
        /// `Public` or `Private`.
        access,
        /// `yyyy-mm-dd hh:mm:ss`; used when none can be read from the file.
        start_time,
        /// `yyyy-mm-dd hh:mm:ss`; used when none can be read from the file.
        end_time,
    }

    list_setters! {
        /// Parent files must already exist on the server.
        parent_filenames,
        contributors_names,
        /// Access groups must already exist on the server.
        access_groups,
    }

    pub fn access_to_all_institutional_users(mut self, value: bool) -> Self {
        self.access_to_all_institutional_users = Some(value);
        self
    }

    pub fn access_to_user_groups(mut self, value: bool) -> Self {
        self.access_to_user_groups = Some(value);
        self
    }

    /// Form fields for one target file, `file_id` first. Lists become repeated keys.
    pub(crate) fn form_fields(&self, file_id: &str) -> FormFields {
        let mut fields = vec![("file_id", file_id.to_string())];

        push_text(&mut fields, "name", &self.name);
        push_text(&mut fields, "experiment_id", &self.experiment_id);
        push_text(&mut fields, "description", &self.description);
        push_text(&mut fields, "tag_names", &self.tag_names);
        push_list(&mut fields, "parent_filenames", &self.parent_filenames);
        push_text(&mut fields, "label_names", &self.label_names);
        push_text(&mut fields, "creator_email", &self.creator_email);
        push_list(&mut fields, "contributors_names", &self.contributors_names);
        push_text(&mut fields, "title", &self.title);
        push_text(&mut fields, "grant_numbers", &self.grant_numbers);
        push_text(&mut fields, "related_websites", &self.related_websites);
        push_text(&mut fields, "access_rights_types", &self.access_rights_types);
        push_text(&mut fields, "license", &self.license);
        push_text(&mut fields, "access", &self.access);
        push_flag(
            &mut fields,
            "access_to_all_institutional_users",
            self.access_to_all_institutional_users,
        );
        push_flag(&mut fields, "access_to_user_groups", self.access_to_user_groups);
        push_list(&mut fields, "access_groups", &self.access_groups);
        push_text(&mut fields, "start_time", &self.start_time);
        push_text(&mut fields, "end_time", &self.end_time);

        fields
    }
}

type FormFields = Vec<(&'static str, String)>;

fn push_text(fields: &mut FormFields, key: &'static str, value: &Option<String>) {
    if let Some(v) = value {
        fields.push((key, v.clone()));
    }
}

fn push_list(fields: &mut FormFields, key: &'static str, value: &Option<Vec<String>>) {
    if let Some(values) = value {
        fields.extend(values.iter().map(|v| (key, v.clone())));
    }
}

fn push_flag(fields: &mut FormFields, key: &'static str, value: Option<bool>) {
    if let Some(flag) = value {
        fields.push((key, flag.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_set_fields_are_sent() {
        let update = UpdateRequest::new().description("updated");
        assert_eq!(
            update.form_fields("197"),
            vec![
                ("file_id", "197".to_string()),
                ("description", "updated".to_string())
            ]
        );
    }

    #[test]
    fn lists_repeat_and_flags_render_as_words() {
        let update = UpdateRequest::new()
            .access("Private")
            .access_to_user_groups(true)
            .access_groups(["EucFACE", "ROS"]);

        let fields = update.form_fields("5");
        assert_eq!(
            &fields[1..],
            &[
                ("access", "Private".to_string()),
                ("access_to_user_groups", "true".to_string()),
                ("access_groups", "EucFACE".to_string()),
                ("access_groups", "ROS".to_string()),
            ]
        );
    }

    #[test]
    fn explicit_empty_value_is_sent() {
        let fields = UpdateRequest::new().title("").form_fields("1");
        assert!(fields.contains(&("title", String::new())));
    }
}
