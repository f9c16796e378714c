//! Conversions between the persisted cookie format and CDP network cookies.

use chromiumoxide::cdp::browser_protocol::network::{Cookie as CdpCookie, CookieParam, CookieSameSite, TimeSinceEpoch};
use gizmo_protocol::{Cookie, SameSite, SessionCookies};

/// Builds `Network.setCookies` parameters. Cookies without a domain are
/// scoped to `fallback_url`.
pub fn to_params(jar: &SessionCookies, fallback_url: &str) -> Vec<CookieParam> {
	jar.cookies
		.iter()
		.map(|cookie| {
			let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
			match &cookie.domain {
				Some(domain) => param.domain = Some(domain.clone()),
				None => param.url = Some(fallback_url.to_string()),
			}
			param.path = cookie.path.clone();
			param.secure = cookie.secure;
			param.http_only = cookie.http_only;
			param.same_site = cookie.same_site.map(|s| match s {
				SameSite::None => CookieSameSite::None,
				SameSite::Lax => CookieSameSite::Lax,
				SameSite::Strict => CookieSameSite::Strict,
			});
			param.expires = cookie.expires.filter(|ts| *ts >= 0.0).map(TimeSinceEpoch::new);
			param
		})
		.collect()
}

pub fn from_cdp(cookies: &[CdpCookie]) -> SessionCookies {
	SessionCookies::new(
		cookies
			.iter()
			.map(|c| Cookie {
				name: c.name.clone(),
				value: c.value.clone(),
				domain: Some(c.domain.clone()),
				path: Some(c.path.clone()),
				expires: Some(if c.session { -1.0 } else { c.expires }),
				http_only: Some(c.http_only),
				secure: Some(c.secure),
				same_site: c.same_site.as_ref().map(|s| match s {
					CookieSameSite::None => SameSite::None,
					CookieSameSite::Lax => SameSite::Lax,
					CookieSameSite::Strict => SameSite::Strict,
				}),
			})
			.collect(),
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn params_keep_domain_or_fall_back_to_url() {
		let jar = SessionCookies::new(vec![
			Cookie::new("a", "1", ".chatgpt.com").same_site(SameSite::Strict),
			Cookie {
				domain: None,
				..Cookie::new("b", "2", "ignored")
			},
		]);

		let params = to_params(&jar, "https://chatgpt.com");
		assert_eq!(params[0].domain.as_deref(), Some(".chatgpt.com"));
		assert!(params[0].url.is_none());
		assert!(matches!(params[0].same_site, Some(CookieSameSite::Strict)));
		assert_eq!(params[1].url.as_deref(), Some("https://chatgpt.com"));
	}

	#[test]
	fn session_cookies_have_no_expiry_param() {
		let jar = SessionCookies::new(vec![Cookie::new("s", "1", "chatgpt.com").expires(-1.0)]);
		assert!(to_params(&jar, "https://chatgpt.com")[0].expires.is_none());
	}
}
