//! External provider allow-list and endpoint table.

use crate::{
    config::ProviderEntry,
    errors::{ProviderError, Result},
    oauth2::OAuth2Provider,
    traits::OAuthProvider,
};
use std::sync::Arc;

macro_rules! external_providers {
    ($($variant:ident => $name:literal,)+) => {
        /// Providers eligible for OAuth dispatch
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ExternalProvider {
            $($variant,)+
        }

        impl ExternalProvider {
            pub const ALL: &'static [ExternalProvider] = &[$(ExternalProvider::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(ExternalProvider::$variant => $name,)+
                }
            }
        }
    };
}

external_providers! {
    Amazon => "amazon",
    Apple => "apple",
    Auth0 => "auth0",
    AzureAd => "azuread",
    AzureAdV2 => "azureadv2",
    BattleNet => "battlenet",
    Bitbucket => "bitbucket",
    Box => "box",
    CloudFoundry => "cloudfoundry",
    DailyMotion => "dailymotion",
    Deezer => "deezer",
    DigitalOcean => "digitalocean",
    Discord => "discord",
    Dropbox => "dropbox",
    EveOnline => "eveonline",
    Facebook => "facebook",
    Fitbit => "fitbit",
    Gitea => "gitea",
    GitHub => "github",
    GitLab => "gitlab",
    Google => "google",
    Heroku => "heroku",
    InfluxCloud => "influxcloud",
    Instagram => "instagram",
    Intercom => "intercom",
    KaKao => "kakao",
    LastFm => "lastfm",
    Line => "line",
    LinkedIn => "linkedin",
    MailRu => "mailru",
    Mastodon => "mastodon",
    Meetup => "meetup",
    MicrosoftOnline => "microsoftonline",
    Naver => "naver",
    NextCloud => "nextcloud",
    Okta => "okta",
    OneDrive => "onedrive",
    OpenIdConnect => "openid-connect",
    Oura => "oura",
    PayPal => "paypal",
    SalesForce => "salesforce",
    SeaTalk => "seatalk",
    Shopify => "shopify",
    Slack => "slack",
    SoundCloud => "soundcloud",
    Spotify => "spotify",
    Steam => "steam",
    Strava => "strava",
    Stripe => "stripe",
    Tumblr => "tumblr",
    Twitch => "twitch",
    Twitter => "twitter",
    TypeTalk => "typetalk",
    Uber => "uber",
    Vk => "vk",
    WePay => "wepay",
    Xero => "xero",
    Yahoo => "yahoo",
    Yammer => "yammer",
    Yandex => "yandex",
}

/// Configuration a provider needs beyond its client credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    None,
    /// Load fails without it
    Required(&'static str),
    /// Falls back to the given value
    Optional(&'static str, &'static str),
}

/// Resolved endpoints and quirks of one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSpec {
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,
    /// Appended to the configured scopes
    pub extra_scopes: &'static [&'static str],
    /// JSON pointer to the profile object inside the user info response
    pub profile_pointer: Option<&'static str>,
    /// Send the client key as `Client-Id` on user info requests
    pub client_id_header: bool,
}

impl ExternalProvider {
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|provider| provider.as_str() == name)
    }

    pub fn dependency(self) -> Dependency {
        match self {
            ExternalProvider::Auth0 => Dependency::Required("a customer domain"),
            ExternalProvider::CloudFoundry => Dependency::Required("a UAA URL"),
            ExternalProvider::NextCloud => Dependency::Required("a server URL"),
            ExternalProvider::Okta => Dependency::Required("an org URL"),
            ExternalProvider::OpenIdConnect => Dependency::Required("a discovery URL"),
            ExternalProvider::AzureAdV2 => Dependency::Optional("a tenant", "common"),
            ExternalProvider::Gitea => Dependency::Optional("a server URL", "https://gitea.com"),
            ExternalProvider::Mastodon => {
                Dependency::Optional("a server URL", "https://mastodon.social")
            }
            _ => Dependency::None,
        }
    }

    /// Whether a generic capability can be built from configuration.
    ///
    /// Other allowed providers are only usable through
    /// [`ProviderRegistry::use_providers`](crate::ProviderRegistry::use_providers).
    pub fn has_factory(self) -> bool {
        self.spec("").is_some()
    }

    /// Endpoint table entry, `None` without a built-in factory.
    ///
    /// `base` is the resolved dependency value. For OpenID Connect the
    /// endpoints are left empty and filled from discovery.
    pub fn spec(self, base: &str) -> Option<ProviderSpec> {
        let base = base.trim_end_matches('/');
        let (auth_url, token_url, user_info_url) = match self {
            ExternalProvider::Amazon => (
                "https://www.amazon.com/ap/oa".to_string(),
                "https://api.amazon.com/auth/o2/token".to_string(),
                "https://api.amazon.com/user/profile".to_string(),
            ),
            ExternalProvider::Auth0 => {
                let host = with_scheme(base);
                (
                    format!("{}/authorize", host),
                    format!("{}/oauth/token", host),
                    format!("{}/userinfo", host),
                )
            }
            ExternalProvider::AzureAdV2 => (
                format!(
                    "https://login.microsoftonline.com/{}/oauth2/v2.0/authorize",
                    base
                ),
                format!("https://login.microsoftonline.com/{}/oauth2/v2.0/token", base),
                "https://graph.microsoft.com/v1.0/me".to_string(),
            ),
            ExternalProvider::Bitbucket => (
                "https://bitbucket.org/site/oauth2/authorize".to_string(),
                "https://bitbucket.org/site/oauth2/access_token".to_string(),
                "https://api.bitbucket.org/2.0/user".to_string(),
            ),
            ExternalProvider::CloudFoundry => (
                format!("{}/oauth/authorize", base),
                format!("{}/oauth/token", base),
                format!("{}/userinfo", base),
            ),
            ExternalProvider::DigitalOcean => (
                "https://cloud.digitalocean.com/v1/oauth/authorize".to_string(),
                "https://cloud.digitalocean.com/v1/oauth/token".to_string(),
                "https://api.digitalocean.com/v2/account".to_string(),
            ),
            ExternalProvider::Discord => (
                "https://discord.com/api/oauth2/authorize".to_string(),
                "https://discord.com/api/oauth2/token".to_string(),
                "https://discord.com/api/users/@me".to_string(),
            ),
            ExternalProvider::Facebook => (
                "https://www.facebook.com/dialog/oauth".to_string(),
                "https://graph.facebook.com/oauth/access_token".to_string(),
                "https://graph.facebook.com/me?fields=id,name,email,picture".to_string(),
            ),
            ExternalProvider::Gitea => (
                format!("{}/login/oauth/authorize", base),
                format!("{}/login/oauth/access_token", base),
                format!("{}/api/v1/user", base),
            ),
            ExternalProvider::GitHub => (
                "https://github.com/login/oauth/authorize".to_string(),
                "https://github.com/login/oauth/access_token".to_string(),
                "https://api.github.com/user".to_string(),
            ),
            ExternalProvider::GitLab => (
                "https://gitlab.com/oauth/authorize".to_string(),
                "https://gitlab.com/oauth/token".to_string(),
                "https://gitlab.com/api/v4/user".to_string(),
            ),
            ExternalProvider::Google => (
                "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                "https://oauth2.googleapis.com/token".to_string(),
                "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            ),
            ExternalProvider::Line => (
                "https://access.line.me/oauth2/v2.1/authorize".to_string(),
                "https://api.line.me/oauth2/v2.1/token".to_string(),
                "https://api.line.me/v2/profile".to_string(),
            ),
            ExternalProvider::LinkedIn => (
                "https://www.linkedin.com/oauth/v2/authorization".to_string(),
                "https://www.linkedin.com/oauth/v2/accessToken".to_string(),
                "https://api.linkedin.com/v2/userinfo".to_string(),
            ),
            ExternalProvider::Mastodon => (
                format!("{}/oauth/authorize", base),
                format!("{}/oauth/token", base),
                format!("{}/api/v1/accounts/verify_credentials", base),
            ),
            ExternalProvider::MicrosoftOnline => (
                "https://login.microsoftonline.com/common/oauth2/v2.0/authorize".to_string(),
                "https://login.microsoftonline.com/common/oauth2/v2.0/token".to_string(),
                "https://graph.microsoft.com/v1.0/me".to_string(),
            ),
            ExternalProvider::NextCloud => (
                format!("{}/apps/oauth2/authorize", base),
                format!("{}/apps/oauth2/api/v1/token", base),
                format!("{}/ocs/v2.php/cloud/user?format=json", base),
            ),
            ExternalProvider::Okta => (
                format!("{}/v1/authorize", base),
                format!("{}/v1/token", base),
                format!("{}/v1/userinfo", base),
            ),
            ExternalProvider::OpenIdConnect => (String::new(), String::new(), String::new()),
            ExternalProvider::Slack => (
                "https://slack.com/openid/connect/authorize".to_string(),
                "https://slack.com/api/openid.connect.token".to_string(),
                "https://slack.com/api/openid.connect.userInfo".to_string(),
            ),
            ExternalProvider::Spotify => (
                "https://accounts.spotify.com/authorize".to_string(),
                "https://accounts.spotify.com/api/token".to_string(),
                "https://api.spotify.com/v1/me".to_string(),
            ),
            ExternalProvider::Twitch => (
                "https://id.twitch.tv/oauth2/authorize".to_string(),
                "https://id.twitch.tv/oauth2/token".to_string(),
                "https://api.twitch.tv/helix/users".to_string(),
            ),
            _ => return None,
        };

        Some(ProviderSpec {
            auth_url,
            token_url,
            user_info_url,
            extra_scopes: self.extra_scopes(),
            profile_pointer: match self {
                ExternalProvider::DigitalOcean => Some("/account"),
                ExternalProvider::NextCloud => Some("/ocs/data"),
                ExternalProvider::Twitch => Some("/data/0"),
                _ => None,
            },
            client_id_header: self == ExternalProvider::Twitch,
        })
    }

    fn extra_scopes(self) -> &'static [&'static str] {
        match self {
            ExternalProvider::DigitalOcean => &["read"],
            ExternalProvider::Discord => &["identify", "email"],
            ExternalProvider::GitHub => &["user:email"],
            ExternalProvider::Line => &["profile", "openid", "email"],
            ExternalProvider::Mastodon => &["read:accounts"],
            ExternalProvider::Okta => &["openid", "profile", "email"],
            ExternalProvider::OpenIdConnect => &["openid"],
            _ => &[],
        }
    }

    /// Construct the capability for a configured entry
    pub fn build(self, entry: &ProviderEntry) -> Result<Arc<dyn OAuthProvider>> {
        if !self.has_factory() {
            return Err(ProviderError::InvalidProvider(self.as_str().to_string()));
        }
        let configured = entry.url.as_deref().filter(|url| !url.trim().is_empty());
        let base = match (self.dependency(), configured) {
            (Dependency::Required(dependency), None) => {
                return Err(ProviderError::MissingDependency {
                    provider: self.as_str().to_string(),
                    dependency,
                })
            }
            (Dependency::Optional(_, fallback), None) => fallback,
            (_, Some(url)) => url,
            (Dependency::None, None) => "",
        };

        let provider = match self {
            ExternalProvider::OpenIdConnect => {
                OAuth2Provider::discover(self.into(), entry, base, self.extra_scopes())?
            }
            _ => {
                let spec = self
                    .spec(base)
                    .ok_or_else(|| ProviderError::InvalidProvider(self.as_str().to_string()))?;
                OAuth2Provider::new(self.into(), entry, spec)?
            }
        };
        Ok(Arc::new(provider))
    }
}

fn with_scheme(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}
