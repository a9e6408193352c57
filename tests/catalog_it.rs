#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use token_relay::{
	catalog::{CatalogConfig, MovieCatalog, MovieCategory, PageCursor},
	error::Error,
	http::ReqwestTransport,
	http_types::StatusCode,
	url::Url,
};

fn catalog(server: &MockServer) -> MovieCatalog<ReqwestTransport> {
	let config = CatalogConfig::new("api-token")
		.expect("Default config should build.")
		.with_base_url(Url::parse(&server.url("/3")).expect("Mock URL should parse."))
		.expect("Loopback base should be accepted.");

	MovieCatalog::new(config)
}

#[tokio::test]
async fn list_sends_api_token_language_and_page() {
	let server = MockServer::start_async().await;
	let client = catalog(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/3/movie/top_rated")
				.header("authorization", "Bearer api-token")
				.query_param("language", "ko-KR")
				.query_param("page", "2");
			then.status(200).header("content-type", "application/json").body(
				"{\"page\":2,\"results\":[{\"id\":238,\"title\":\"The Godfather\",\"poster_path\":\"/godfather.jpg\",\"vote_average\":8.7,\"genre_ids\":[18,80]}],\"total_pages\":3,\"total_results\":41}",
			);
		})
		.await;
	let mut cursor = PageCursor::new();
	let page = client
		.list(MovieCategory::TopRated, cursor.next_page())
		.await
		.expect("Listing should succeed.");

	mock.assert_async().await;

	assert_eq!(page.page, 2);
	assert!(page.has_next());
	assert_eq!(page.results[0].title, "The Godfather");
	assert_eq!(page.results[0].genre_ids, vec![18, 80]);
	assert_eq!(
		client
			.config
			.image_url(page.results[0].poster_path.as_deref().expect("Poster should be present."))
			.expect("Image URL should resolve.")
			.as_str(),
		"https://image.tmdb.org/t/p/original/godfather.jpg"
	);
}

#[tokio::test]
async fn page_zero_is_requested_as_first_page() {
	let server = MockServer::start_async().await;
	let client = catalog(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/3/movie/upcoming").query_param("page", "1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"page\":1,\"results\":[],\"total_pages\":1,\"total_results\":0}");
		})
		.await;
	let page = client.list(MovieCategory::Upcoming, 0).await.expect("Listing should succeed.");

	mock.assert_async().await;

	assert!(page.results.is_empty());
	assert!(!page.has_next());
}

#[tokio::test]
async fn detail_and_credits_decode_nested_payloads() {
	let server = MockServer::start_async().await;
	let client = catalog(&server);
	let detail = server
		.mock_async(|when, then| {
			when.method(GET).path("/3/movie/550").query_param("language", "ko-KR");
			then.status(200).header("content-type", "application/json").body(
				"{\"id\":550,\"title\":\"Fight Club\",\"backdrop_path\":\"/fc.jpg\",\"runtime\":139,\"tagline\":\"Mischief. Mayhem. Soap.\",\"genres\":[{\"id\":18,\"name\":\"Drama\"}]}",
			);
		})
		.await;
	let credits = server
		.mock_async(|when, then| {
			when.method(GET).path("/3/movie/550/credits");
			then.status(200).header("content-type", "application/json").body(
				"{\"id\":550,\"cast\":[{\"id\":819,\"name\":\"Edward Norton\",\"character\":\"Narrator\",\"profile_path\":null}],\"crew\":[{\"id\":7467,\"name\":\"David Fincher\",\"job\":\"Director\",\"profile_path\":\"/df.jpg\"}]}",
			);
		})
		.await;
	let movie = client.detail(550).await.expect("Detail should load.");
	let people = client.credits(550).await.expect("Credits should load.");

	detail.assert_async().await;
	credits.assert_async().await;

	assert_eq!(movie.movie.backdrop_path.as_deref(), Some("/fc.jpg"));
	assert_eq!(movie.runtime, Some(139));
	assert_eq!(people.cast[0].character, "Narrator");
	assert_eq!(
		people.directors().map(|member| member.name.as_str()).collect::<Vec<_>>(),
		["David Fincher"]
	);
}

#[tokio::test]
async fn failures_surface_as_status_errors() {
	let server = MockServer::start_async().await;
	let client = catalog(&server);
	let missing = server
		.mock_async(|when, then| {
			when.method(GET).path("/3/movie/404");
			then.status(404).body("{\"status_code\":34}");
		})
		.await;
	let unauthorized = server
		.mock_async(|when, then| {
			when.method(GET).path("/3/movie/popular");
			then.status(401);
		})
		.await;
	let err = client.detail(404).await.expect_err("Unknown ids should fail.");

	missing.assert_async().await;

	assert!(matches!(&err, Error::Status(status) if status.status == StatusCode::NOT_FOUND));

	let err = client.list(MovieCategory::Popular, 1).await.expect_err("Bad tokens should fail.");

	unauthorized.assert_async().await;

	assert!(err.is_unauthorized());
}
