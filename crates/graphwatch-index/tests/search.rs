//! Integration tests for the search engine over a realistic trigger corpus.

use graphwatch_index::{MemoryEngine, SearchEngine, SearchOptions, TriggerDocument};

fn doc(
    id: &str,
    name: &str,
    desc: &str,
    score: i64,
    tags: &[&str],
    author: &str,
) -> TriggerDocument {
    TriggerDocument {
        id: id.to_string(),
        name: name.to_string(),
        desc: desc.to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        created_by: author.to_string(),
        last_check_score: score,
    }
}

/// Thirty-two triggers: thirty firing, two healthy, three tagged as kobold
/// encounters (one of them healthy), two without an author, five created by
/// the 2023 interns.
fn fixture() -> Vec<TriggerDocument> {
    vec![
        doc("t01", "Ankheg burrow collapse", "", 9, &["encounters"], "internship2023"),
        doc("t02", "Basilisk gaze exposure", "", 8, &["encounters"], "internship2023"),
        doc("t03", "Bugbear patrol spotted", "", 7, &["encounters"], "internship2023"),
        doc("t04", "Cockatrice in the henhouse", "", 6, &["encounters"], "monster-manual"),
        doc(
            "t05",
            "Kobold ambush at the bridge",
            "small pack, ranged",
            5,
            &["encounters", "Kobold"],
            "monster-manual",
        ),
        doc(
            "t06",
            "Kobold sapper tunnel",
            "collapsing supports",
            5,
            &["encounters", "Kobold"],
            "monster-manual",
        ),
        doc(
            "t07",
            "Dragonshield medium guard post",
            "a medium encounter behind the gate",
            5,
            &["encounters", "guards"],
            "monster-manual",
        ),
        doc("t08", "Displacer beast sighting", "", 5, &["encounters"], "monster-manual"),
        doc("t09", "Ettin arguing with itself", "", 4, &["encounters"], "monster-manual"),
        doc("t10", "Flumph drift over town", "", 4, &["sightings"], "internship2023"),
        doc("t11", "Gelatinous cube in corridor", "", 4, &["dungeon"], "internship2023"),
        doc("t12", "Gnoll warband raiding", "", 4, &["encounters"], "monster-manual"),
        doc("t13", "Grick nest in the mine", "", 3, &["dungeon"], "monster-manual"),
        doc("t14", "Harpy song from the cliffs", "", 3, &["sightings"], "monster-manual"),
        doc("t15", "Hobgoblin siege line", "", 3, &["encounters"], "monster-manual"),
        doc("t16", "Hydra in the reservoir", "", 3, &["encounters"], "monster-manual"),
        doc("t17", "Manticore circling", "", 3, &["sightings"], "monster-manual"),
        doc("t18", "Mimic posing as chest", "", 2, &["dungeon"], "monster-manual"),
        doc("t19", "Minotaur maze patrol", "", 2, &["dungeon"], "monster-manual"),
        doc("t20", "Ochre jelly split", "", 2, &["dungeon"], ""),
        doc("t21", "Otyugh in the refuse pit", "", 2, &["dungeon"], ""),
        doc("t22", "Owlbear den too close", "", 2, &["sightings"], "monster-manual"),
        doc("t23", "Peryton shadow overhead", "", 2, &["sightings"], "monster-manual"),
        doc("t24", "Roper on the cavern wall", "", 1, &["dungeon"], "monster-manual"),
        doc("t25", "Rust monster near armory", "", 1, &["dungeon"], "monster-manual"),
        doc("t26", "Sahuagin raid on the docks", "", 1, &["encounters"], "monster-manual"),
        doc("t27", "Shambling mound in the fen", "", 1, &["sightings"], "monster-manual"),
        doc("t28", "Stirge swarm at dusk", "", 1, &["sightings"], "monster-manual"),
        doc("t29", "Troll under the bridge", "", 1, &["encounters"], "monster-manual"),
        doc("t30", "Wight in the barrow", "", 1, &["dungeon"], "monster-manual"),
        doc("t31", "Kobold watch post quiet", "", 0, &["encounters", "Kobold"], "monster-manual"),
        doc("t32", "Village perimeter calm", "", 0, &["sightings"], "monster-manual"),
    ]
}

fn engine() -> MemoryEngine {
    let engine = MemoryEngine::new();
    let batch: Vec<Option<TriggerDocument>> = fixture().into_iter().map(Some).collect();
    engine.write(&batch).expect("fixture write");
    engine
}

fn ids(results: &[graphwatch_index::SearchResult]) -> Vec<String> {
    results.iter().map(|r| r.trigger_id.clone()).collect()
}

/// Score descending, then name, then id; no search terms means no relevance.
fn canonical_order(mut docs: Vec<TriggerDocument>) -> Vec<String> {
    docs.sort_by(|a, b| {
        b.last_check_score
            .cmp(&a.last_check_score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
    docs.into_iter().map(|d| d.id).collect()
}

#[test]
fn match_all_returns_the_whole_corpus_in_canonical_order() {
    let e = engine();
    let (hits, total) = e
        .search(&SearchOptions {
            page: 0,
            size: 50,
            ..SearchOptions::default()
        })
        .expect("search");
    assert_eq!(total, 32);
    assert_eq!(ids(&hits), canonical_order(fixture()));
}

#[test]
fn only_problems_drops_the_healthy_triggers() {
    let e = engine();
    let (hits, total) = e
        .search(&SearchOptions {
            only_problems: true,
            ..SearchOptions::default()
        })
        .expect("search");
    assert_eq!(total, 30);
    assert!(ids(&hits).iter().all(|id| id != "t31" && id != "t32"));
}

#[test]
fn conjunctive_tags_with_only_problems() {
    let e = engine();

    // Three triggers carry both tags; one of them is healthy.
    let (tagged, total) = e
        .search(&SearchOptions {
            tags: vec!["encounters".to_string(), "Kobold".to_string()],
            ..SearchOptions::default()
        })
        .expect("search");
    assert_eq!(total, 3);
    assert_eq!(ids(&tagged), vec!["t05", "t06", "t31"]);

    let (firing, total) = e
        .search(&SearchOptions {
            tags: vec!["encounters".to_string(), "Kobold".to_string()],
            only_problems: true,
            ..SearchOptions::default()
        })
        .expect("search");
    assert_eq!(total, 2);
    assert_eq!(ids(&firing), vec!["t05", "t06"]);
}

#[test]
fn text_search_highlights_both_fields() {
    let e = engine();
    let (hits, total) = e
        .search(&SearchOptions {
            search_string: "dragonshield medium".to_string(),
            ..SearchOptions::default()
        })
        .expect("search");
    assert_eq!(total, 1);
    assert_eq!(hits[0].trigger_id, "t07");

    let name = hits[0]
        .highlights
        .iter()
        .find(|h| h.field == "name")
        .expect("name highlight");
    assert_eq!(
        name.value,
        "<mark>Dragonshield</mark> <mark>medium</mark> guard post"
    );

    let desc = hits[0]
        .highlights
        .iter()
        .find(|h| h.field == "desc")
        .expect("desc highlight");
    assert!(desc.value.contains("<mark>medium</mark>"));
    assert!(!desc.value.contains("<mark>gate</mark>"));
}

#[test]
fn fuzzy_text_search_tolerates_a_typo() {
    let e = engine();
    let (hits, _) = e
        .search(&SearchOptions {
            search_string: "kobolds".to_string(),
            ..SearchOptions::default()
        })
        .expect("search");
    // "kobolds" is within distance one of "kobold".
    assert_eq!(ids(&hits), vec!["t05", "t06", "t31"]);
}

#[test]
fn author_filter_distinguishes_empty_from_absent() {
    let e = engine();

    // Flag unset: the author value is ignored entirely.
    let (_, total) = e
        .search(&SearchOptions {
            created_by: String::new(),
            need_search_by_created_by: false,
            ..SearchOptions::default()
        })
        .expect("search");
    assert_eq!(total, 32);

    // Flag set with the empty author selects the authorless triggers.
    let (anon, total) = e
        .search(&SearchOptions {
            created_by: String::new(),
            need_search_by_created_by: true,
            ..SearchOptions::default()
        })
        .expect("search");
    assert_eq!(total, 2);
    assert_eq!(ids(&anon), vec!["t20", "t21"]);

    let (_, total) = e
        .search(&SearchOptions {
            created_by: "internship2023".to_string(),
            need_search_by_created_by: true,
            ..SearchOptions::default()
        })
        .expect("search");
    assert_eq!(total, 5);
}

#[test]
fn pagination_windows_are_disjoint_and_ordered() {
    let e = engine();
    let (all, _) = e
        .search(&SearchOptions {
            size: -1,
            ..SearchOptions::default()
        })
        .expect("search");

    let mut paged: Vec<String> = Vec::new();
    for page in 0..7 {
        let (hits, total) = e
            .search(&SearchOptions {
                page,
                size: 5,
                ..SearchOptions::default()
            })
            .expect("search");
        assert_eq!(total, 32);
        paged.extend(ids(&hits));
    }
    assert_eq!(paged, ids(&all));
}

#[test]
fn page_past_the_end_is_empty_but_total_is_kept() {
    let e = engine();
    let (hits, total) = e
        .search(&SearchOptions {
            page: 9,
            size: 10,
            ..SearchOptions::default()
        })
        .expect("search");
    assert!(hits.is_empty());
    assert_eq!(total, 32);
}
