pub const APP_NAME: &str = "shipping-quotes";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

/// Release label: the git tag the binary was built from, or the crate version.
pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}

/// User agent sent with every carrier request.
pub fn user_agent() -> String {
    format!("{}/{}", APP_NAME, version_label())
}
