//! Identifier resolution: user input -> repository coordinate.
//!
//! An identifier is either an explicit `owner/name` pair, which resolves
//! immediately, or an npm package name, which is looked up on the registry
//! and mapped to the repository its metadata points at.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::ResolveError;
use crate::registry::RegistryClient;
use crate::types::RepoCoordinate;

lazy_static! {
    /// npm package name grammar, scope prefix optional.
    static ref NPM_NAME: Regex =
        Regex::new(r"^(@[a-z0-9-~][a-z0-9-._~]*/)?[a-z0-9-~][a-z0-9-._~]*$").unwrap();

    /// Hosting URL pattern: `github.com/owner/name`.
    static ref HOSTING_URL: Regex =
        Regex::new(r"github\.com/([\w-]+)/([\w.-]+)").unwrap();

    /// Pages URL pattern: `owner.github.io/name`.
    static ref PAGES_URL: Regex =
        Regex::new(r"\b([\w-]+)\.github\.io/([\w.-]+)\b").unwrap();
}

/// Returns true when the identifier matches the npm package name grammar.
pub fn is_registry_name(identifier: &str) -> bool {
    NPM_NAME.is_match(identifier)
}

/// Extracts a repository coordinate from a repository or homepage URL.
///
/// Tries the hosting pattern (`github.com/owner/name`, with a single
/// trailing `.git` stripped from the name) before the pages pattern
/// (`owner.github.io/name`). Dots inside the name segment survive, so
/// `git+https://github.com/vercel/next.js.git` yields `vercel/next.js`.
pub fn extract_coordinate(url: &str) -> Option<RepoCoordinate> {
    if let Some(caps) = HOSTING_URL.captures(url) {
        let name = caps[2].strip_suffix(".git").unwrap_or(&caps[2]);
        if !name.is_empty() {
            return Some(RepoCoordinate::new(&caps[1], name));
        }
    }
    if let Some(caps) = PAGES_URL.captures(url) {
        return Some(RepoCoordinate::new(&caps[1], &caps[2]));
    }
    None
}

/// Resolves a user-supplied identifier into a repository coordinate.
///
/// Checks, in order:
///
/// 1. Coordinate shape (`owner/name`) - returned directly, no network call.
/// 2. npm name grammar - the registry is queried for the package metadata
///    and a coordinate is extracted from its `repository.url`, falling back
///    to `homepage`.
///
/// The check order is deliberate: a coordinate-shaped string never reaches
/// the registry, and a scoped name (leading `@`) never parses as a
/// coordinate.
///
/// ## Errors
///
/// - [`ResolveError::InvalidIdentifier`] - matches neither grammar
/// - [`ResolveError::Unresolvable`] - metadata found, but no repository URL
///   could be extracted from it
/// - [`ResolveError::Registry`] - the lookup itself failed
pub async fn resolve(
    registry: &RegistryClient,
    identifier: &str,
) -> Result<RepoCoordinate, ResolveError> {
    if let Ok(coord) = identifier.parse::<RepoCoordinate>() {
        debug!(identifier, %coord, "identifier already in coordinate form");
        return Ok(coord);
    }

    if !is_registry_name(identifier) {
        return Err(ResolveError::InvalidIdentifier(identifier.to_string()));
    }

    let metadata = registry.lookup_package(identifier).await?;
    debug!(
        identifier,
        repository_url = %metadata.repository_url,
        homepage = %metadata.homepage,
        "registry lookup complete"
    );

    extract_coordinate(&metadata.repository_url)
        .or_else(|| extract_coordinate(&metadata.homepage))
        .ok_or_else(|| ResolveError::Unresolvable {
            package: identifier.to_string(),
            repository_url: metadata.repository_url,
            homepage: metadata.homepage,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn registry_grammar_accepts_plain_and_scoped_names() {
        assert!(is_registry_name("vue"));
        assert!(is_registry_name("@vue/cli"));
        assert!(is_registry_name("lodash.merge"));
        assert!(!is_registry_name("vuejs/core"));
        assert!(!is_registry_name("Vue"));
        assert!(!is_registry_name(""));
    }

    #[test]
    fn extracts_hosting_url_and_strips_git_suffix() {
        let coord = extract_coordinate("https://github.com/vuejs/core.git").unwrap();
        assert_eq!(coord, RepoCoordinate::new("vuejs", "core"));
    }

    #[test]
    fn extracts_hosting_url_with_scheme_prefix() {
        let coord = extract_coordinate("git+https://github.com/vuejs/core.git").unwrap();
        assert_eq!(coord, RepoCoordinate::new("vuejs", "core"));
    }

    #[test]
    fn keeps_dots_inside_name_segment() {
        let coord = extract_coordinate("git+https://github.com/vercel/next.js.git").unwrap();
        assert_eq!(coord, RepoCoordinate::new("vercel", "next.js"));
    }

    #[test]
    fn extracts_pages_url() {
        let coord = extract_coordinate("https://vuejs.github.io/core").unwrap();
        assert_eq!(coord, RepoCoordinate::new("vuejs", "core"));
    }

    #[test]
    fn returns_none_for_unrelated_url() {
        assert!(extract_coordinate("https://example.com/whatever").is_none());
    }

    #[tokio::test]
    async fn coordinate_shape_resolves_without_registry_lookup() {
        // Server with no mounted mocks: any request would come back 404 and
        // fail the resolve, so success proves no lookup happened.
        let server = MockServer::start().await;
        let registry = RegistryClient::with_base_url(server.uri());

        let coord = resolve(&registry, "vuejs/core").await.unwrap();
        assert_eq!(coord, RepoCoordinate::new("vuejs", "core"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn registry_name_resolves_through_repository_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "homepage": "https://vuejs.org",
                "repository": { "type": "git", "url": "git+https://github.com/vuejs/core.git" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = RegistryClient::with_base_url(server.uri());
        let coord = resolve(&registry, "vue").await.unwrap();
        assert_eq!(coord, RepoCoordinate::new("vuejs", "core"));
    }

    #[tokio::test]
    async fn falls_back_to_homepage_when_repository_url_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "homepage": "https://vuejs.github.io/core",
                "repository": { "type": "git", "url": "" }
            })))
            .mount(&server)
            .await;

        let registry = RegistryClient::with_base_url(server.uri());
        let coord = resolve(&registry, "core").await.unwrap();
        assert_eq!(coord, RepoCoordinate::new("vuejs", "core"));
    }

    #[tokio::test]
    async fn fails_unresolvable_with_raw_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/leftpad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "homepage": "https://example.com",
                "repository": { "type": "git", "url": "https://gitlab.com/x/y" }
            })))
            .mount(&server)
            .await;

        let registry = RegistryClient::with_base_url(server.uri());
        let err = resolve(&registry, "leftpad").await.unwrap_err();
        match err {
            ResolveError::Unresolvable {
                package,
                repository_url,
                homepage,
            } => {
                assert_eq!(package, "leftpad");
                assert_eq!(repository_url, "https://gitlab.com/x/y");
                assert_eq!(homepage, "https://example.com");
            }
            other => panic!("expected Unresolvable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_identifier_matching_neither_grammar() {
        let server = MockServer::start().await;
        let registry = RegistryClient::with_base_url(server.uri());

        let err = resolve(&registry, "Not A Package!").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidIdentifier(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scoped_name_goes_to_the_registry_not_the_coordinate_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/@vue%2Fcli"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "homepage": "",
                "repository": { "type": "git", "url": "git+https://github.com/vuejs/vue-cli.git" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = RegistryClient::with_base_url(server.uri());
        let coord = resolve(&registry, "@vue/cli").await.unwrap();
        assert_eq!(coord, RepoCoordinate::new("vuejs", "vue-cli"));
    }
}
