//! Movie-metadata client for the third-party catalog API.
//!
//! The catalog authenticates with a static API bearer token, so it talks to the transport directly
//! and never joins the session's refresh cycle. Any non-success reply surfaces as
//! [`Error::Status`].

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	descriptor::builder::validate_base,
	error::ConfigError,
	http::{ApiRequest, HttpTransport},
	obs::{self, OpKind},
};

/// Connection settings for the catalog API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
	/// API root every path is appended to.
	pub base_url: Url,
	/// Value for the `language` query parameter.
	pub language: String,
	/// Root for poster and backdrop images.
	pub image_base: Url,
	/// Static bearer token issued by the catalog provider.
	pub api_token: TokenSecret,
}
impl CatalogConfig {
	/// Default API root.
	pub const DEFAULT_BASE_URL: &'static str = "https://api.themoviedb.org/3";
	/// Default image root, serving original-size assets.
	pub const DEFAULT_IMAGE_BASE: &'static str = "https://image.tmdb.org/t/p/original";
	/// Default response language.
	pub const DEFAULT_LANGUAGE: &'static str = "ko-KR";

	/// Creates a configuration with the default endpoints and language.
	pub fn new(api_token: impl Into<TokenSecret>) -> Result<Self> {
		let parse = |raw: &str| {
			Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { path: raw.to_owned(), source })
		};

		Ok(Self {
			base_url: parse(Self::DEFAULT_BASE_URL)?,
			language: Self::DEFAULT_LANGUAGE.into(),
			image_base: parse(Self::DEFAULT_IMAGE_BASE)?,
			api_token: api_token.into(),
		})
	}

	/// Points the client at another API root.
	pub fn with_base_url(mut self, base_url: Url) -> Result<Self> {
		validate_base(&base_url).map_err(ConfigError::from)?;

		self.base_url = base_url;

		Ok(self)
	}

	/// Overrides the response language.
	pub fn with_language(mut self, language: impl Into<String>) -> Self {
		self.language = language.into();

		self
	}

	/// Overrides the image root.
	pub fn with_image_base(mut self, image_base: Url) -> Result<Self> {
		validate_base(&image_base).map_err(ConfigError::from)?;

		self.image_base = image_base;

		Ok(self)
	}

	/// Builds the absolute URL of a poster or backdrop path such as `/abc.jpg`.
	pub fn image_url(&self, path: &str) -> Result<Url> {
		append(&self.image_base, path)
	}
}

/// Curated movie lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieCategory {
	/// Currently popular titles.
	Popular,
	/// Titles releasing soon.
	Upcoming,
	/// Highest-rated titles.
	TopRated,
	/// Titles in theaters now.
	NowPlaying,
}
impl MovieCategory {
	/// Every category, in menu order.
	pub const ALL: [Self; 4] = [Self::Popular, Self::NowPlaying, Self::TopRated, Self::Upcoming];

	/// Path segment used by the catalog API.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Popular => "popular",
			Self::Upcoming => "upcoming",
			Self::TopRated => "top_rated",
			Self::NowPlaying => "now_playing",
		}
	}
}
impl Display for MovieCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Summary entry returned by list endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
	/// Catalog identifier.
	pub id: u64,
	/// Localized title.
	pub title: String,
	/// Title in the original language.
	#[serde(default)]
	pub original_title: String,
	/// ISO 639-1 code of the original language.
	#[serde(default)]
	pub original_language: String,
	/// Localized synopsis.
	#[serde(default)]
	pub overview: String,
	/// Poster image path, relative to the image root.
	#[serde(default)]
	pub poster_path: Option<String>,
	/// Backdrop image path, relative to the image root.
	#[serde(default)]
	pub backdrop_path: Option<String>,
	/// Release date as `YYYY-MM-DD`; empty when unannounced.
	#[serde(default)]
	pub release_date: String,
	/// Genre identifiers.
	#[serde(default)]
	pub genre_ids: Vec<u64>,
	/// Adult-content flag.
	#[serde(default)]
	pub adult: bool,
	/// Whether the entry is a video rather than a feature.
	#[serde(default)]
	pub video: bool,
	/// Popularity score.
	#[serde(default)]
	pub popularity: f64,
	/// Mean rating.
	#[serde(default)]
	pub vote_average: f64,
	/// Number of ratings.
	#[serde(default)]
	pub vote_count: u64,
}

/// One page of a movie list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
	/// One-based page number.
	pub page: u32,
	/// Movies on this page.
	pub results: Vec<Movie>,
	/// Total pages available.
	#[serde(default)]
	pub total_pages: u32,
	/// Total movies available.
	#[serde(default)]
	pub total_results: u64,
}
impl MoviePage {
	/// Whether a later page exists.
	pub fn has_next(&self) -> bool {
		self.page < self.total_pages
	}
}

/// Named genre.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
	/// Genre identifier.
	pub id: u64,
	/// Localized genre name.
	pub name: String,
}

/// Full record for a single movie.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
	/// Fields shared with list entries.
	#[serde(flatten)]
	pub movie: Movie,
	/// Running time in minutes.
	#[serde(default)]
	pub runtime: Option<u32>,
	/// Marketing tagline.
	#[serde(default)]
	pub tagline: Option<String>,
	/// Genres with names.
	#[serde(default)]
	pub genres: Vec<Genre>,
}

/// Actor billed on a movie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
	/// Person identifier.
	pub id: u64,
	/// Performer name.
	pub name: String,
	/// Role played.
	#[serde(default)]
	pub character: String,
	/// Portrait path, relative to the image root.
	#[serde(default)]
	pub profile_path: Option<String>,
}

/// Crew member credited on a movie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewMember {
	/// Person identifier.
	pub id: u64,
	/// Crew member name.
	pub name: String,
	/// Job title, for example `Director`.
	#[serde(default)]
	pub job: String,
	/// Portrait path, relative to the image root.
	#[serde(default)]
	pub profile_path: Option<String>,
}

/// Cast and crew for a movie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieCredits {
	/// Billed cast, in billing order.
	#[serde(default)]
	pub cast: Vec<CastMember>,
	/// Credited crew.
	#[serde(default)]
	pub crew: Vec<CrewMember>,
}
impl MovieCredits {
	/// Crew members credited as `Director`.
	pub fn directors(&self) -> impl Iterator<Item = &CrewMember> {
		self.crew.iter().filter(|member| member.job == "Director")
	}
}

/// Client for the catalog API.
pub struct MovieCatalog<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every catalog call.
	pub transport: Arc<T>,
	/// Connection settings.
	pub config: CatalogConfig,
}
impl<T> MovieCatalog<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a catalog client over the caller-provided transport.
	pub fn with_transport(config: CatalogConfig, transport: impl Into<Arc<T>>) -> Self {
		Self { transport: transport.into(), config }
	}

	/// Fetches one page of a curated list. Page `0` is treated as page `1`.
	pub async fn list(&self, category: MovieCategory, page: u32) -> Result<MoviePage> {
		let page = page.max(1).to_string();

		obs::observe(
			OpKind::Catalog,
			"list",
			self.fetch(&format!("/movie/{category}"), &[("page", page.as_str())]),
		)
		.await
	}

	/// Fetches the full record for one movie.
	pub async fn detail(&self, id: u64) -> Result<MovieDetail> {
		obs::observe(OpKind::Catalog, "detail", self.fetch(&format!("/movie/{id}"), &[])).await
	}

	/// Fetches cast and crew for one movie.
	pub async fn credits(&self, id: u64) -> Result<MovieCredits> {
		obs::observe(OpKind::Catalog, "credits", self.fetch(&format!("/movie/{id}/credits"), &[]))
			.await
	}

	async fn fetch<R>(&self, path: &str, query: &[(&str, &str)]) -> Result<R>
	where
		R: for<'de> Deserialize<'de>,
	{
		let mut url = append(&self.config.base_url, path)?;

		url.query_pairs_mut()
			.append_pair("language", &self.config.language)
			.extend_pairs(query.iter().copied());

		let request = ApiRequest::get(url.clone()).bearer(&self.config.api_token)?;
		let response = self.transport.execute(request).await?.error_for_status(&url)?;

		response.json()
	}
}
#[cfg(feature = "reqwest")]
impl MovieCatalog<crate::http::ReqwestTransport> {
	/// Creates a catalog client that provisions its own reqwest transport.
	pub fn new(config: CatalogConfig) -> Self {
		Self::with_transport(config, crate::http::ReqwestTransport::default())
	}
}
impl<T> Clone for MovieCatalog<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), config: self.config.clone() }
	}
}
impl<T> Debug for MovieCatalog<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MovieCatalog").field("config", &self.config).finish()
	}
}

/// One-based page position for paginated lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
	page: u32,
}
impl PageCursor {
	/// Cursor at page 1.
	pub const fn new() -> Self {
		Self { page: 1 }
	}

	/// Current page.
	pub const fn page(self) -> u32 {
		self.page
	}

	/// Whether a previous page exists.
	pub const fn has_prev(self) -> bool {
		self.page > 1
	}

	/// Advances one page and returns the new position.
	pub fn next_page(&mut self) -> u32 {
		self.page = self.page.saturating_add(1);

		self.page
	}

	/// Steps back one page, staying on page 1 at the start.
	pub fn prev_page(&mut self) -> u32 {
		if self.has_prev() {
			self.page -= 1;
		}

		self.page
	}
}
impl Default for PageCursor {
	fn default() -> Self {
		Self::new()
	}
}

fn append(base: &Url, path: &str) -> Result<Url> {
	let joined =
		format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'));

	Url::parse(&joined)
		.map_err(|source| ConfigError::InvalidUrl { path: path.to_owned(), source }.into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_public_endpoints() {
		let config = CatalogConfig::new("api-token").expect("Default config should build.");

		assert_eq!(config.base_url.as_str(), "https://api.themoviedb.org/3");
		assert_eq!(config.language, "ko-KR");
		assert_eq!(
			config.image_url("/poster.jpg").expect("Image path should resolve.").as_str(),
			"https://image.tmdb.org/t/p/original/poster.jpg"
		);
	}

	#[test]
	fn remote_plain_http_roots_are_rejected() {
		let err = CatalogConfig::new("api-token")
			.expect("Default config should build.")
			.with_base_url(Url::parse("http://movies.example.com").expect("URL should parse."))
			.expect_err("Plain HTTP to a remote host must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::Descriptor(_))));
	}

	#[test]
	fn category_labels_match_api_paths() {
		let labels = MovieCategory::ALL.map(MovieCategory::as_str);

		assert_eq!(labels, ["popular", "now_playing", "top_rated", "upcoming"]);
		assert_eq!(
			serde_json::to_string(&MovieCategory::TopRated).expect("Category should serialize."),
			"\"top_rated\""
		);
	}

	#[test]
	fn cursor_never_drops_below_first_page() {
		let mut cursor = PageCursor::default();

		assert!(!cursor.has_prev());
		assert_eq!(cursor.prev_page(), 1);
		assert_eq!(cursor.next_page(), 2);
		assert!(cursor.has_prev());
		assert_eq!(cursor.prev_page(), 1);
		assert_eq!(cursor.prev_page(), 1);
	}

	#[test]
	fn detail_flattens_summary_fields() {
		let detail: MovieDetail = serde_json::from_str(
			"{\"id\":550,\"title\":\"Fight Club\",\"poster_path\":null,\"release_date\":\"1999-10-15\",\"vote_average\":8.4,\"runtime\":139,\"tagline\":\"Mischief. Mayhem. Soap.\",\"genres\":[{\"id\":18,\"name\":\"Drama\"}]}",
		)
		.expect("Detail payload should decode.");

		assert_eq!(detail.movie.id, 550);
		assert_eq!(detail.movie.poster_path, None);
		assert_eq!(detail.runtime, Some(139));
		assert_eq!(detail.genres, vec![Genre { id: 18, name: "Drama".into() }]);
	}

	#[test]
	fn credits_expose_directors() {
		let credits: MovieCredits = serde_json::from_str(
			"{\"cast\":[{\"id\":1,\"name\":\"Actor\",\"character\":\"Narrator\",\"profile_path\":null}],\"crew\":[{\"id\":2,\"name\":\"Director Person\",\"job\":\"Director\"},{\"id\":3,\"name\":\"Writer Person\",\"job\":\"Screenplay\"}]}",
		)
		.expect("Credits payload should decode.");

		let directors = credits.directors().map(|member| member.name.as_str()).collect::<Vec<_>>();

		assert_eq!(directors, ["Director Person"]);
	}
}
