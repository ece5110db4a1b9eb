//! Screenshot host approval
//!
//! The tracker only renders images from a known set of hosts. Screenshot
//! pairs whose image URL resolves to an unapproved host are dropped from the
//! context before the description is composed; dropping is logged, never
//! escalated.

use url::Url;

use crate::release::ReleaseContext;

/// Canonical host aliases the tracker accepts.
pub const APPROVED_IMAGE_HOSTS: &[&str] = &["imgbox", "imgbb", "bhd", "imgur", "postimg"];

/// Domain suffix -> canonical host alias.
const HOST_ALIASES: &[(&str, &str)] = &[
    ("ibb.co", "imgbb"),
    ("imgbox.com", "imgbox"),
    ("beyondhd.co", "bhd"),
    ("imgur.com", "imgur"),
    ("postimg.cc", "postimg"),
];

/// Resolves a hostname to its canonical alias, matching subdomains.
fn host_alias(host: &str) -> Option<&'static str> {
    HOST_ALIASES
        .iter()
        .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{domain}")))
        .map(|(_, alias)| *alias)
}

/// Drops screenshots hosted outside the approved set.
pub fn check_hosts(context: &mut ReleaseContext) {
    context.screenshots.retain(|shot| {
        let host = Url::parse(&shot.image_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned));

        match host.as_deref().and_then(host_alias) {
            Some(alias) if APPROVED_IMAGE_HOSTS.contains(&alias) => true,
            _ => {
                tracing::warn!(
                    image_url = %shot.image_url,
                    "dropping screenshot from unapproved image host"
                );
                false
            }
        }
    });
}
