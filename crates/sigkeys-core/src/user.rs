//! User claims: statements linking a sigchain key to an account on a service.
//!
//! A user statement carries a [`User`] as its data. The claim is proven by
//! publishing a message signed by the same key at the user's URL, which
//! anyone can fetch and check with [`User::find_and_verify`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::edx25519::{EdX25519Key, EdX25519PublicKey};
use crate::error::{EncodingError, UserError, VerifyError};
use crate::id::ID;
use crate::statement::Statement;

/// Type of a user statement.
pub const USER_TYPE: &str = "user";

const MESSAGE_BEGIN: &str = "BEGIN MESSAGE.";
const MESSAGE_END: &str = "END MESSAGE.";

/// A user claim.
///
/// Serializes with short keys in a fixed order,
/// `{"k":..,"n":..,"sq":..,"sr":..,"u":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "k")]
    pub kid: ID,

    #[serde(rename = "n")]
    pub name: String,

    /// Sequence number of the statement carrying this claim.
    #[serde(rename = "sq", default, skip_serializing_if = "is_zero")]
    pub seq: u64,

    #[serde(rename = "sr")]
    pub service: String,

    #[serde(rename = "u")]
    pub url: String,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl User {
    /// Create a claim for one of the built-in services, normalizing the name.
    pub fn new(kid: ID, service: &str, name: &str, url: &str, seq: u64) -> Result<Self, UserError> {
        let validator = service_validator(service)
            .ok_or_else(|| UserError::InvalidService(service.to_string()))?;
        Self::with_validator(validator, kid, name, url, seq)
    }

    /// Create a claim checked by a custom validator.
    pub fn with_validator(
        validator: &dyn ServiceValidator,
        kid: ID,
        name: &str,
        url: &str,
        seq: u64,
    ) -> Result<Self, UserError> {
        let name = validator.normalize_name(name);
        validator.validate_name(&name)?;
        let url = parse_https(url)?;
        validator.validate_url(&name, &url)?;
        Ok(Self {
            kid,
            name,
            seq,
            service: validator.id().to_string(),
            url: url.to_string(),
        })
    }

    /// Check the name and URL against the claim's built-in service.
    pub fn validate(&self) -> Result<(), UserError> {
        let validator = service_validator(&self.service)
            .ok_or_else(|| UserError::InvalidService(self.service.clone()))?;
        if validator.normalize_name(&self.name) != self.name {
            return Err(UserError::InvalidName(format!("{} is not normalized", self.name)));
        }
        validator.validate_name(&self.name)?;
        validator.validate_url(&self.name, &parse_https(&self.url)?)
    }

    /// Statement data for this claim.
    pub fn to_json(&self) -> Result<Vec<u8>, UserError> {
        serde_json::to_vec(self).map_err(|e| EncodingError::Json(e.to_string()).into())
    }

    /// Decode and check the claim carried by a user statement.
    pub fn from_statement(st: &Statement) -> Result<Self, UserError> {
        if st.kind != USER_TYPE {
            return Err(UserError::NotUserStatement(st.kind.clone()));
        }
        let user: User =
            serde_json::from_slice(&st.data).map_err(|e| EncodingError::Json(e.to_string()))?;
        if user.kid != st.kid {
            return Err(UserError::KidMismatch {
                expected: st.kid.clone(),
                got: user.kid,
            });
        }
        if user.seq != st.seq {
            return Err(UserError::SeqMismatch {
                expected: st.seq,
                got: user.seq,
            });
        }
        user.validate()?;
        Ok(user)
    }

    /// The message to publish at the claim URL: the claim signed by the
    /// sigchain key, base64 between begin and end markers.
    pub fn sign_message(&self, key: &EdX25519Key) -> Result<String, UserError> {
        if key.id() != &self.kid {
            return Err(UserError::KidMismatch {
                expected: self.kid.clone(),
                got: key.id().clone(),
            });
        }
        let signed = key.sign(&self.to_json()?);
        Ok(format!("{MESSAGE_BEGIN}\n{}\n{MESSAGE_END}", STANDARD.encode(signed)))
    }

    /// Find a signed message in fetched content and check it proves this
    /// claim.
    ///
    /// Returns the claim found in the message, or `Ok(None)` if the content
    /// holds no message at all.
    pub fn find_and_verify(&self, content: &str) -> Result<Option<User>, UserError> {
        let Some(encoded) = find_message(content) else {
            return Ok(None);
        };
        let signed = STANDARD.decode(encoded).map_err(|e| EncodingError::Base64 {
            field: "message",
            reason: e.to_string(),
        })?;
        let public = EdX25519PublicKey::from_id(&self.kid).map_err(VerifyError::from)?;
        let message = public.verify(&signed)?;
        let found: User =
            serde_json::from_slice(&message).map_err(|e| EncodingError::Json(e.to_string()))?;
        if &found != self {
            return Err(UserError::MessageMismatch(format!(
                "{}@{} does not match {}@{}",
                found.name, found.service, self.name, self.service
            )));
        }
        Ok(Some(found))
    }
}

/// The base64 body between the message markers, whitespace removed.
fn find_message(content: &str) -> Option<String> {
    let start = content.find(MESSAGE_BEGIN)? + MESSAGE_BEGIN.len();
    let end = content[start..].find(MESSAGE_END)? + start;
    Some(
        content[start..end]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect(),
    )
}

fn parse_https(url: &str) -> Result<Url, UserError> {
    let parsed = Url::parse(url).map_err(|e| UserError::InvalidUrl(format!("{url}: {e}")))?;
    if parsed.scheme() != "https" {
        return Err(UserError::InvalidUrl(format!("{url}: scheme must be https")));
    }
    Ok(parsed)
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn check_host(url: &Url, hosts: &[&str]) -> Result<(), UserError> {
    match url.host_str() {
        Some(host) if hosts.iter().any(|h| *h == host) => Ok(()),
        _ => Err(UserError::InvalidUrl(format!("{url}: host must be one of {hosts:?}"))),
    }
}

fn check_name_chars(name: &str, max: usize, allowed: impl Fn(char) -> bool) -> Result<(), UserError> {
    if name.is_empty() || name.len() > max {
        return Err(UserError::InvalidName(format!("{name}: length must be 1..={max}")));
    }
    if let Some(c) = name.chars().find(|c| !allowed(*c)) {
        return Err(UserError::InvalidName(format!("{name}: invalid character {c:?}")));
    }
    Ok(())
}

/// Rules for claims on one service.
pub trait ServiceValidator: Send + Sync {
    /// Service identifier stored in the claim.
    fn id(&self) -> &'static str;

    /// Canonical form of a user name.
    fn normalize_name(&self, name: &str) -> String {
        name.to_lowercase()
    }

    /// Check a normalized name.
    fn validate_name(&self, name: &str) -> Result<(), UserError>;

    /// Check that the URL is where `name` would publish a message.
    fn validate_url(&self, name: &str, url: &Url) -> Result<(), UserError>;
}

/// Claims proven by a GitHub gist: `https://gist.github.com/{name}/{id}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Github;

impl ServiceValidator for Github {
    fn id(&self) -> &'static str {
        "github"
    }

    fn validate_name(&self, name: &str) -> Result<(), UserError> {
        check_name_chars(name, 39, |c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }

    fn validate_url(&self, name: &str, url: &Url) -> Result<(), UserError> {
        check_host(url, &["gist.github.com"])?;
        match path_segments(url).as_slice() {
            [user, _gist] if user.eq_ignore_ascii_case(name) => Ok(()),
            _ => Err(UserError::InvalidUrl(format!("{url}: expected /{name}/<gist>"))),
        }
    }
}

/// Claims proven by a tweet: `https://twitter.com/{name}/status/{id}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Twitter;

impl ServiceValidator for Twitter {
    fn id(&self) -> &'static str {
        "twitter"
    }

    fn validate_name(&self, name: &str) -> Result<(), UserError> {
        check_name_chars(name, 15, |c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    fn validate_url(&self, name: &str, url: &Url) -> Result<(), UserError> {
        check_host(url, &["twitter.com", "mobile.twitter.com", "x.com"])?;
        match path_segments(url).as_slice() {
            [user, "status", id]
                if user.eq_ignore_ascii_case(name) && id.chars().all(|c| c.is_ascii_digit()) =>
            {
                Ok(())
            }
            _ => Err(UserError::InvalidUrl(format!("{url}: expected /{name}/status/<id>"))),
        }
    }
}

/// Claims proven by a reddit post titled with the user name:
/// `https://www.reddit.com/r/{sub}/comments/{id}/{name}/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reddit;

impl ServiceValidator for Reddit {
    fn id(&self) -> &'static str {
        "reddit"
    }

    fn validate_name(&self, name: &str) -> Result<(), UserError> {
        check_name_chars(name, 20, |c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
        })
    }

    fn validate_url(&self, name: &str, url: &Url) -> Result<(), UserError> {
        check_host(url, &["reddit.com", "www.reddit.com", "old.reddit.com"])?;
        match path_segments(url).as_slice() {
            ["r", _sub, "comments", _id, user] if user.eq_ignore_ascii_case(name) => Ok(()),
            _ => Err(UserError::InvalidUrl(format!(
                "{url}: expected /r/<sub>/comments/<id>/{name}/"
            ))),
        }
    }
}

/// Claims proven by a file on a domain the user controls:
/// `https://{name}/.well-known/sigkeys.txt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Https;

/// Path of the message file for [`Https`] claims.
pub const HTTPS_WELL_KNOWN_PATH: &str = "/.well-known/sigkeys.txt";

impl ServiceValidator for Https {
    fn id(&self) -> &'static str {
        "https"
    }

    fn validate_name(&self, name: &str) -> Result<(), UserError> {
        check_name_chars(name, 253, |c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.'
        })?;
        if !name.contains('.') || name.starts_with('.') || name.ends_with('.') {
            return Err(UserError::InvalidName(format!("{name}: not a domain")));
        }
        Ok(())
    }

    fn validate_url(&self, name: &str, url: &Url) -> Result<(), UserError> {
        if url.host_str() != Some(name) || url.path() != HTTPS_WELL_KNOWN_PATH || url.query().is_some() {
            return Err(UserError::InvalidUrl(format!(
                "{url}: expected https://{name}{HTTPS_WELL_KNOWN_PATH}"
            )));
        }
        Ok(())
    }
}

/// The built-in validator for a service id.
pub fn service_validator(service: &str) -> Option<&'static dyn ServiceValidator> {
    match service {
        "github" => Some(&Github),
        "twitter" => Some(&Twitter),
        "reddit" => Some(&Reddit),
        "https" => Some(&Https),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sigchain::Sigchain;
    use crate::statement::StatementBuilder;

    fn alice() -> EdX25519Key {
        EdX25519Key::from_seed(&[0x01; 32])
    }

    fn github_user(seq: u64) -> User {
        User::new(
            alice().id().clone(),
            "github",
            "Alice",
            "https://gist.github.com/alice/70281cc427850c272a8574af4d8564d9",
            seq,
        )
        .unwrap()
    }

    #[test]
    fn test_json_key_order() {
        let user = github_user(1);
        assert_eq!(
            String::from_utf8(user.to_json().unwrap()).unwrap(),
            format!(
                r#"{{"k":"{}","n":"alice","sq":1,"sr":"github","u":"https://gist.github.com/alice/70281cc427850c272a8574af4d8564d9"}}"#,
                alice().id()
            )
        );
        let unsequenced = String::from_utf8(github_user(0).to_json().unwrap()).unwrap();
        assert!(!unsequenced.contains("\"sq\""));
    }

    #[test]
    fn test_name_normalized() {
        assert_eq!(github_user(1).name, "alice");
    }

    #[test]
    fn test_unknown_service() {
        assert_eq!(
            User::new(alice().id().clone(), "myspace", "alice", "https://myspace.com/alice", 1),
            Err(UserError::InvalidService("myspace".into()))
        );
    }

    #[test]
    fn test_service_urls() {
        let kid = alice().id().clone();
        let ok = [
            ("twitter", "alice", "https://twitter.com/alice/status/1205589994380783616"),
            ("reddit", "alice", "https://www.reddit.com/r/sigkeys/comments/f8g9vd/alice/"),
            ("https", "alice.dev", "https://alice.dev/.well-known/sigkeys.txt"),
        ];
        for (service, name, url) in ok {
            User::new(kid.clone(), service, name, url, 1)
                .unwrap_or_else(|e| panic!("{service}: {e}"));
        }

        let bad = [
            ("github", "alice", "http://gist.github.com/alice/1"),
            ("github", "alice", "https://gist.github.com/bob/1"),
            ("github", "alice", "https://github.com/alice/1"),
            ("twitter", "alice", "https://twitter.com/alice/status/abc"),
            ("reddit", "alice", "https://www.reddit.com/r/sigkeys/comments/f8g9vd/bob/"),
            ("https", "alice.dev", "https://bob.dev/.well-known/sigkeys.txt"),
            ("https", "alice.dev", "https://alice.dev/sigkeys.txt"),
        ];
        for (service, name, url) in bad {
            assert!(
                matches!(
                    User::new(kid.clone(), service, name, url, 1),
                    Err(UserError::InvalidUrl(_))
                ),
                "{service} {url}"
            );
        }
    }

    #[test]
    fn test_invalid_names() {
        let kid = alice().id().clone();
        let url = "https://gist.github.com/al_ice/1";
        assert!(matches!(
            User::new(kid.clone(), "github", "al_ice", url, 1),
            Err(UserError::InvalidName(_))
        ));
        assert!(matches!(
            User::new(kid.clone(), "twitter", "", "https://twitter.com//status/1", 1),
            Err(UserError::InvalidName(_))
        ));
        assert!(matches!(
            User::new(kid, "https", "localhost", "https://localhost/.well-known/sigkeys.txt", 1),
            Err(UserError::InvalidName(_))
        ));
    }

    #[test]
    fn test_from_statement() {
        let key = alice();
        let mut sc = Sigchain::new(key.id().clone());
        let user = github_user(1);
        let st = sc
            .new_statement(user.to_json().unwrap(), &key, USER_TYPE, 1234567890001)
            .unwrap();
        sc.add(st.clone()).unwrap();
        assert_eq!(User::from_statement(&st).unwrap(), user);
        assert_eq!(sc.users().unwrap(), vec![user]);

        sc.revoke(1, &key, 1234567890002).unwrap();
        assert!(sc.users().unwrap().is_empty());
    }

    #[test]
    fn test_from_statement_checks_seq_and_type() {
        let key = alice();
        let wrong_seq = StatementBuilder::new(key.id().clone())
            .seq(2)
            .data(github_user(1).to_json().unwrap())
            .kind(USER_TYPE)
            .sign(&key);
        assert_eq!(
            User::from_statement(&wrong_seq),
            Err(UserError::SeqMismatch { expected: 2, got: 1 })
        );

        let wrong_type = StatementBuilder::new(key.id().clone())
            .seq(1)
            .data(github_user(1).to_json().unwrap())
            .kind("test")
            .sign(&key);
        assert_eq!(
            User::from_statement(&wrong_type),
            Err(UserError::NotUserStatement("test".into()))
        );
    }

    #[test]
    fn test_from_statement_checks_kid() {
        let bob = EdX25519Key::from_seed(&[0x02; 32]);
        let st = StatementBuilder::new(bob.id().clone())
            .seq(1)
            .data(github_user(1).to_json().unwrap())
            .kind(USER_TYPE)
            .sign(&bob);
        assert!(matches!(
            User::from_statement(&st),
            Err(UserError::KidMismatch { .. })
        ));
    }

    #[test]
    fn test_sign_message_and_verify() {
        let user = github_user(1);
        let msg = user.sign_message(&alice()).unwrap();
        assert!(msg.starts_with("BEGIN MESSAGE.\n"));

        // Published content often wraps the message in other text.
        let page = format!("<html><pre>\n{msg}\n</pre></html>");
        assert_eq!(user.find_and_verify(&page), Ok(Some(user.clone())));
        assert_eq!(user.find_and_verify("nothing here"), Ok(None));
    }

    #[test]
    fn test_verify_rejects_other_claims() {
        let user = github_user(1);
        let other = github_user(2);
        let msg = other.sign_message(&alice()).unwrap();
        assert!(matches!(
            user.find_and_verify(&msg),
            Err(UserError::MessageMismatch(_))
        ));

        let bob = EdX25519Key::from_seed(&[0x02; 32]);
        assert!(matches!(
            user.sign_message(&bob),
            Err(UserError::KidMismatch { .. })
        ));

        // A message signed by another key over the same claim.
        let forged = format!(
            "{MESSAGE_BEGIN}\n{}\n{MESSAGE_END}",
            STANDARD.encode(bob.sign(&user.to_json().unwrap()))
        );
        assert_eq!(
            user.find_and_verify(&forged),
            Err(UserError::Verify(VerifyError::VerifyFailed))
        );
    }
}
