//! OpenAPI document assembled from the handler annotations.

use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

use super::handlers::{admin, auth, system, task, template, user};

/// The service's OpenAPI 3 description.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "taskboard",
        description = "Multi-user task tracking API. Every mutation is also pushed to `/ws` subscribers as a JSON text frame."
    ),
    paths(
        auth::register,
        auth::login,
        auth::current_role,
        user::list_users,
        task::create_task,
        task::list_tasks,
        task::get_task,
        task::update_task,
        task::delete_task,
        template::create_template,
        template::list_templates,
        template::list_templates_by_owner,
        template::get_template,
        template::update_template,
        template::delete_template,
        template::create_task_from_template,
        admin::change_role,
        admin::list_users,
        admin::create_user,
        admin::update_user,
        admin::delete_user,
        system::health_handler,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and session role"),
        (name = "Users", description = "User directory"),
        (name = "Tasks", description = "Task management"),
        (name = "Templates", description = "Reusable task templates"),
        (name = "Admin", description = "Administrator-only user management"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

#[derive(Debug)]
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in ["/api/v1/tasks", "/api/v1/templates/{id}/tasks", "/health"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let has_bearer = doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"));
        assert!(has_bearer);
    }
}
