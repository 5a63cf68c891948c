//! End-to-end scenarios for the city list controller.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use cityscope_cities::query::derive_view;
use cityscope_cities::{
    AdvanceOutcome, City, CityError, CityListController, CitySource, OpenDataSoftSource,
    PageOutcome, PageRequest, SortDirection, SortKey,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIRST_PAGE: [(&str, u64); 20] = [
    ("Aachen", 265_208),
    ("Aalborg", 151_534),
    ("Aalen", 68_456),
    ("Aarau", 21_036),
    ("Aarhus", 285_273),
    ("Aba", 897_560),
    ("Abakan", 167_740),
    ("Abbeville", 26_567),
    ("Aberdeen", 196_670),
    ("Abidjan", 4_707_404),
    ("Abu Dhabi", 603_492),
    ("Acapulco", 652_136),
    ("Accra", 1_963_264),
    ("Adana", 1_248_988),
    ("Adelaide", 1_225_235),
    ("Agadir", 698_310),
    ("Agra", 1_430_055),
    ("Ajaccio", 54_364),
    ("Albany", 97_856),
    ("Arnhem", 141_674),
];

fn city(name: &str, population: u64) -> City {
    City {
        name: name.to_string(),
        country: "Somewhere".to_string(),
        timezone: "UTC".to_string(),
        population,
        latitude: 10.0,
        longitude: 20.0,
    }
}

fn first_page() -> Vec<City> {
    FIRST_PAGE.iter().map(|&(n, p)| city(n, p)).collect()
}

fn numbered_page(page: usize) -> Vec<City> {
    (0..20)
        .map(|i| city(&format!("B{:02}-{:02}", page, i), (page * 100 + i) as u64))
        .collect()
}

/// Serves scripted results in order and records what was asked for.
#[derive(Default)]
struct ScriptedSource {
    results: Mutex<VecDeque<Result<Vec<City>, CityError>>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedSource {
    fn new(results: Vec<Result<Vec<City>, CityError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CitySource for ScriptedSource {
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<City>, CityError> {
        self.requests.lock().unwrap().push(request);
        let next = self.results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Never answers.
struct HangingSource;

impl CitySource for HangingSource {
    async fn fetch_page(&self, _request: PageRequest) -> Result<Vec<City>, CityError> {
        std::future::pending::<Result<Vec<City>, CityError>>().await
    }
}

fn assert_view_is_derived<S: CitySource>(controller: &CityListController<S>) {
    let collection = controller.collection();
    let expected = derive_view(
        collection.full_set(),
        collection.search_text(),
        collection.sort_spec(),
    );
    assert_eq!(collection.view_indices(), expected.as_slice());
}

#[tokio::test]
async fn sort_twice_then_search_keeps_descending_population() {
    let source = ScriptedSource::new(vec![Ok(first_page())]);
    let mut controller = CityListController::new(source);

    let outcome = controller.advance_page().await;
    assert!(matches!(outcome, AdvanceOutcome::Completed(PageOutcome::Appended(20))));

    controller.set_sort(SortKey::Population);
    let spec = controller.set_sort(SortKey::Population);
    assert_eq!(spec.direction, SortDirection::Descending);

    let populations: Vec<u64> = controller.collection().view().map(|c| c.population).collect();
    assert_eq!(populations.len(), 20);
    assert!(populations.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(controller.collection().view_row(0).unwrap().name, "Abidjan");

    controller.set_search_text("Aa");
    let names: Vec<&str> = controller
        .collection()
        .view()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Aarhus", "Aachen", "Aalborg", "Aalen", "Aarau"]);
    assert_view_is_derived(&controller);
}

#[tokio::test]
async fn two_fetches_append_forty_in_page_order() {
    let source = ScriptedSource::new(vec![Ok(numbered_page(0)), Ok(numbered_page(1))]);
    let mut controller = CityListController::new(source);

    controller.advance_page().await;
    let after_first: Vec<City> = controller.collection().full_set().to_vec();
    controller.advance_page().await;

    let full_set = controller.collection().full_set();
    assert_eq!(full_set.len(), 40);
    assert_eq!(&full_set[..20], after_first.as_slice());
    assert_eq!(&full_set[20..], numbered_page(1).as_slice());
    assert_eq!(controller.collection().page(), 2);
}

#[tokio::test]
async fn failed_fetch_changes_nothing() {
    let source = ScriptedSource::new(vec![
        Ok(first_page()),
        Err(CityError::Status {
            status: 500,
            message: "boom".into(),
        }),
    ]);
    let mut controller = CityListController::new(source);

    controller.advance_page().await;
    controller.set_sort(SortKey::Latitude);
    let full_before = controller.collection().full_set().to_vec();
    let view_before = controller.collection().view_indices().to_vec();

    let outcome = controller.advance_page().await;

    assert!(matches!(
        outcome,
        AdvanceOutcome::Completed(PageOutcome::Failed(CityError::Status { status: 500, .. }))
    ));
    assert_eq!(controller.collection().full_set(), full_before.as_slice());
    assert_eq!(controller.collection().view_indices(), view_before.as_slice());
    assert!(!controller.collection().is_loading());
    assert!(controller.collection().can_advance());
}

#[tokio::test]
async fn search_suppresses_pagination() {
    let source = ScriptedSource::new(vec![Ok(first_page()), Ok(numbered_page(1))]);
    let mut controller = CityListController::new(source);

    controller.advance_page().await;
    controller.set_search_text("ab");
    assert!(matches!(controller.advance_page().await, AdvanceOutcome::Skipped));
    assert_eq!(controller.collection().full_set().len(), 20);

    controller.set_search_text("");
    assert!(matches!(
        controller.advance_page().await,
        AdvanceOutcome::Completed(PageOutcome::Appended(20))
    ));
}

#[tokio::test]
async fn requests_follow_cursor_offsets() {
    let source = std::sync::Arc::new(ScriptedSource::new(vec![
        Ok(numbered_page(0)),
        Ok(numbered_page(1)),
        Ok(numbered_page(2)),
    ]));
    let mut controller = CityListController::new(source.clone());

    for _ in 0..3 {
        controller.advance_page().await;
        assert_view_is_derived(&controller);
    }

    let offsets: Vec<u64> = source.requests().iter().map(|r| r.offset()).collect();
    assert_eq!(offsets, vec![0, 20, 40]);
}

#[tokio::test]
async fn full_set_only_grows_by_prefix_extension() {
    let source = ScriptedSource::new(vec![
        Ok(numbered_page(0)),
        Err(CityError::Parse("truncated".into())),
        Ok(numbered_page(2)),
        Ok(Vec::new()),
        Ok(numbered_page(4)),
    ]);
    let mut controller = CityListController::new(source);
    controller.set_sort(SortKey::Name);
    controller.set_sort(SortKey::Name);

    let mut previous: Vec<City> = Vec::new();
    for _ in 0..5 {
        controller.advance_page().await;
        let current = controller.collection().full_set();
        assert!(current.len() >= previous.len());
        assert_eq!(&current[..previous.len()], previous.as_slice());
        assert_view_is_derived(&controller);
        previous = current.to_vec();
    }
    assert_eq!(previous.len(), 60);
}

#[tokio::test]
async fn teardown_during_fetch_discards_result() {
    let mut controller = CityListController::new(HangingSource);
    let token = controller.cancellation_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), controller.advance_page())
        .await
        .expect("cancellation should end the fetch");

    assert!(matches!(outcome, AdvanceOutcome::Completed(PageOutcome::Discarded)));
    assert!(controller.collection().full_set().is_empty());
    assert!(controller.collection().is_torn_down());
    assert!(matches!(controller.advance_page().await, AdvanceOutcome::Skipped));
}

#[tokio::test]
async fn open_data_soft_pages_through_mock_server() {
    let mock_server = MockServer::start().await;

    for (start, page) in [("0", 0usize), ("20", 1usize)] {
        let records: Vec<serde_json::Value> = numbered_page(page)
            .iter()
            .map(|c| {
                serde_json::json!({
                    "fields": {
                        "name": c.name,
                        "cou_name_en": c.country,
                        "timezone": c.timezone,
                        "population": c.population,
                        "coordinates": [c.latitude, c.longitude]
                    }
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/api/records/1.0/search/"))
            .and(query_param("start", start))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "records": records })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let source = OpenDataSoftSource::new(&mock_server.uri(), "cities").unwrap();
    let mut controller = CityListController::new(source);

    controller.advance_page().await;
    controller.advance_page().await;

    let full_set = controller.collection().full_set();
    assert_eq!(full_set.len(), 40);
    assert_eq!(full_set[0].name, "B00-00");
    assert_eq!(full_set[39].name, "B01-19");
}
