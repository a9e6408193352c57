//! Account operations that drive the pipeline: sign-in, sign-up, sign-out, and profile lookup.

// self
use crate::{
	_prelude::*,
	auth::{SessionTokens, TokenKey},
	http::{ApiRequest, HttpTransport},
	obs::{self, OpKind},
	pipeline::AuthPipeline,
};

/// Response envelope wrapping every first-party payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
	/// Backend success flag.
	pub status: bool,
	/// HTTP status echoed by the backend.
	pub status_code: u16,
	/// Human-readable message.
	pub message: String,
	/// Wrapped payload.
	pub data: T,
}

/// Email/password pair submitted at sign-in.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl Credentials {
	/// Pairs an email with its password.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Account details submitted at sign-up.
#[derive(Clone, Serialize, Deserialize)]
pub struct SignupForm {
	/// Display name.
	pub name: String,
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
	/// Optional profile text.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bio: Option<String>,
	/// Optional avatar URL.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub avatar: Option<String>,
}
impl SignupForm {
	/// Creates a form with the required fields.
	pub fn new(
		name: impl Into<String>,
		email: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			email: email.into(),
			password: password.into(),
			bio: None,
			avatar: None,
		}
	}
}
impl Debug for SignupForm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignupForm")
			.field("name", &self.name)
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Token pair plus the identity returned at sign-in.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResult {
	/// Account identifier.
	pub id: u64,
	/// Display name.
	pub name: String,
	/// Newly minted tokens.
	#[serde(flatten)]
	pub tokens: SessionTokens,
}

/// Profile of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	/// Account identifier.
	pub id: u64,
	/// Display name.
	pub name: String,
	/// Account email.
	pub email: String,
	/// Optional profile text.
	#[serde(default)]
	pub bio: Option<String>,
	/// Optional avatar URL.
	#[serde(default)]
	pub avatar: Option<String>,
	/// Creation timestamp as reported by the backend.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Last update timestamp as reported by the backend.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}

/// Whether a usable access token is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
	/// An access token is stored; protected views may render.
	Authenticated,
	/// No access token; protected views should redirect to login.
	Anonymous,
}

/// Session helpers bound to one pipeline.
pub struct SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	pipeline: AuthPipeline<T>,
}
impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Wraps a pipeline.
	pub fn new(pipeline: AuthPipeline<T>) -> Self {
		Self { pipeline }
	}

	/// Underlying pipeline, for requests beyond the session helpers.
	pub fn pipeline(&self) -> &AuthPipeline<T> {
		&self.pipeline
	}

	/// Exchanges credentials for a session and persists both tokens.
	///
	/// A `401` here means the credentials were wrong, so no refresh is attempted.
	pub async fn signin(&self, credentials: &Credentials) -> Result<SigninResult> {
		obs::observe(OpKind::Session, "signin", async {
			let request =
				self.pipeline.post_json(&self.pipeline.descriptor.endpoints.signin, credentials)?;
			let response = self.pipeline.send_public(request).await?;
			let signed_in = response.json::<Envelope<SigninResult>>()?.data;

			self.pipeline.store.save_session(signed_in.tokens.clone()).await?;

			Ok(signed_in)
		})
		.await
	}

	/// Creates an account. The new account is not signed in.
	pub async fn signup(&self, form: &SignupForm) -> Result<UserProfile> {
		obs::observe(OpKind::Session, "signup", async {
			let request =
				self.pipeline.post_json(&self.pipeline.descriptor.endpoints.signup, form)?;
			let response = self.pipeline.send_public(request).await?;

			Ok(response.json::<Envelope<UserProfile>>()?.data)
		})
		.await
	}

	/// Ends the session on the backend, then forgets both tokens.
	///
	/// Tokens are kept when the backend call fails so the caller can retry.
	pub async fn signout(&self) -> Result<()> {
		obs::observe(OpKind::Session, "signout", async {
			let url = self.pipeline.resolve(&self.pipeline.descriptor.endpoints.signout)?;

			self.pipeline.request(ApiRequest::post(url)).await?;
			self.pipeline.store.clear_session().await?;

			Ok(())
		})
		.await
	}

	/// Fetches the signed-in user's profile, refreshing the session if needed.
	pub async fn profile(&self) -> Result<UserProfile> {
		obs::observe(OpKind::Session, "profile", async {
			let request = self.pipeline.get(&self.pipeline.descriptor.endpoints.profile)?;
			let response = self.pipeline.request(request).await?;

			Ok(response.json::<Envelope<UserProfile>>()?.data)
		})
		.await
	}

	/// Reports whether an access token is stored.
	pub async fn state(&self) -> Result<SessionState> {
		let token = self.pipeline.store.get(TokenKey::AccessToken).await?;

		Ok(if token.is_some() { SessionState::Authenticated } else { SessionState::Anonymous })
	}
}
impl<T> Clone for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { pipeline: self.pipeline.clone() }
	}
}
impl<T> Debug for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient").field("pipeline", &self.pipeline).finish()
	}
}
