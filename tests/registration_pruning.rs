use chrono::DateTime;
use serde_json::{Value, json};
use virkning::bound::{Bound, parse_timestamp, utc};
use virkning::consolidate::MergePolicy;
use virkning::effect::EffectiveTime;
use virkning::registration::{Registration, prune_value};
use virkning::validity::{ValidityRequest, resolve_window};
use virkning::VirkningError;

fn at(s: &str) -> Bound {
    Bound::Timestamp(parse_timestamp(s).expect("timestamp"))
}

fn virkning(from: &str, to: &str) -> Value {
    json!({"from": from, "from_included": true, "to": to, "to_included": false})
}

fn organisation() -> Value {
    json!({
        "fratidspunkt": {"tidsstempeldatotid": "2015-06-01T10:00:00+02:00", "graenseindikator": true},
        "tiltidspunkt": {"tidsstempeldatotid": "infinity"},
        "livscykluskode": "Importeret",
        "brugerref": "42c432e8-9c4a-11e6-9f62-873cf34a735f",
        "attributter": {
            "organisationegenskaber": [
                {"brugervendtnoegle": "magenta", "organisationsnavn": "Magenta ApS",
                 "virkning": virkning("1900-01-01", "1950-01-01")},
                {"brugervendtnoegle": "magenta", "organisationsnavn": "Magenta Aps",
                 "virkning": virkning("1950-01-01", "infinity")},
            ]
        },
        "tilstande": {
            "organisationgyldighed": [
                {"gyldighed": "Aktiv", "virkning": virkning("1900-01-01", "1950-01-01")},
            ]
        },
        "relationer": {
            "overordnet": [
                {"uuid": "00000000-0000-0000-0000-000000000001",
                 "virkning": virkning("1900-01-01", "1920-01-01")},
            ],
            "adresser": [
                {"uuid": "00000000-0000-0000-0000-000000000002",
                 "virkning": virkning("1990-01-01", "infinity")},
            ],
            "tilknyttedebrugere": [],
        }
    })
}

#[test]
fn sections_and_metadata_are_told_apart() {
    let registration = Registration::from_json(&organisation()).unwrap();
    let sections: Vec<&String> = registration.sections().keys().collect();
    assert_eq!(sections, ["attributter", "relationer", "tilstande"]);
    assert_eq!(registration.metadata().len(), 4);
    assert_eq!(registration.metadata()["livscykluskode"], json!("Importeret"));
    assert_eq!(registration.fragment_count(), 5);
    assert_eq!(registration.slot("relationer", "tilknyttedebrugere").map(Vec::len), Some(0));
}

#[test]
fn emptied_categories_and_sections_are_removed() {
    let registration = Registration::from_json(&organisation()).unwrap();
    let window = EffectiveTime::half_open(at("1960-01-01"), at("1970-01-01")).unwrap();
    let pruned = registration.prune(&window);
    assert!(pruned.section("tilstande").is_none());
    assert!(pruned.section("relationer").is_none());
    let attributes = pruned.section("attributter").unwrap();
    assert_eq!(attributes.slots().len(), 1);
    assert_eq!(attributes.slot("organisationegenskaber").map(Vec::len), Some(1));
    assert_eq!(pruned.metadata(), registration.metadata());
}

#[test]
fn categories_not_emptied_survive() {
    let registration = Registration::from_json(&organisation()).unwrap();
    let window = resolve_window(
        ValidityRequest::Present,
        DateTime::parse_from_rfc3339("2017-01-01T00:00:00+01:00").unwrap(),
    )
    .unwrap();
    let pruned = registration.prune(&window);
    let relations = pruned.section("relationer").unwrap();
    assert_eq!(relations.slots().keys().collect::<Vec<_>>(), ["adresser"]);
    assert!(pruned.section("tilstande").is_none());
}

#[test]
fn unbounded_prune_only_drops_empty_categories() {
    let registration = Registration::from_json(&organisation()).unwrap();
    let pruned = registration.prune(&EffectiveTime::unbounded());
    assert_eq!(pruned.fragment_count(), registration.fragment_count());
    assert!(pruned.slot("relationer", "tilknyttedebrugere").is_none());
    assert!(pruned.slot("relationer", "adresser").is_some());
}

#[test]
fn json_round_trip_keeps_payloads_and_metadata() {
    let document = organisation();
    let registration = Registration::from_json(&document).unwrap();
    let written = registration.to_json();
    assert_eq!(written["fratidspunkt"], document["fratidspunkt"]);
    assert_eq!(written["brugerref"], document["brugerref"]);
    let name = &written["attributter"]["organisationegenskaber"][1];
    assert_eq!(name["organisationsnavn"], json!("Magenta Aps"));
    assert_eq!(name["virkning"]["to"], json!("infinity"));
    assert_eq!(name["virkning"]["from"], json!("1950-01-01T00:00:00+00:00"));
    assert_eq!(Registration::from_json(&written).unwrap(), registration);
}

#[test]
fn consolidation_over_a_registration() {
    let document = json!({
        "tilstande": {"organisationgyldighed": [
            {"gyldighed": "Aktiv", "virkning": virkning("1950-01-01", "infinity")},
            {"gyldighed": "Aktiv", "virkning": virkning("1900-01-01", "1950-01-01")},
        ]}
    });
    let registration = Registration::from_json(&document).unwrap();
    let merged = registration.consolidate(MergePolicy::Coalesce);
    let slot = merged.slot("tilstande", "organisationgyldighed").unwrap();
    assert_eq!(slot.len(), 1);
    assert_eq!(
        slot[0].interval(),
        &EffectiveTime::half_open(at("1900-01-01"), Bound::PositiveInfinity).unwrap()
    );
}

#[test]
fn registrations_nested_in_read_results_are_pruned() {
    let result = json!({
        "results": [[
            {"id": "00000000-0000-0000-0000-00000000abcd", "registreringer": [organisation()]}
        ]]
    });
    let window = EffectiveTime::half_open(at("1960-01-01"), at("1970-01-01")).unwrap();
    let pruned = prune_value(&result, &window, utc()).unwrap();
    let object = &pruned["results"][0][0];
    assert_eq!(object["id"], json!("00000000-0000-0000-0000-00000000abcd"));
    let registration = &object["registreringer"][0];
    assert!(registration.get("tilstande").is_none());
    assert!(registration.get("relationer").is_none());
    assert_eq!(registration["livscykluskode"], json!("Importeret"));
    assert_eq!(registration["attributter"]["organisationegenskaber"].as_array().map(Vec::len), Some(1));
}

#[test]
fn values_without_registrations_pass_through() {
    let value = json!({"results": [[{"id": "x", "count": 3}]], "note": null});
    assert_eq!(prune_value(&value, &EffectiveTime::unbounded(), utc()).unwrap(), value);
}

#[test]
fn malformed_documents() {
    assert!(matches!(
        Registration::from_json(&json!([1, 2])),
        Err(VirkningError::MalformedDocument(_))
    ));
    let bad_flag = json!({"attributter": {"egenskaber": [
        {"navn": "x", "virkning": {"from": "1900-01-01", "from_included": "yes", "to": "infinity"}}
    ]}});
    assert!(matches!(
        Registration::from_json(&bad_flag),
        Err(VirkningError::MalformedDocument(_))
    ));
    let reversed = json!({"attributter": {"egenskaber": [
        {"navn": "x", "virkning": virkning("2000-01-01", "1900-01-01")}
    ]}});
    assert!(matches!(
        prune_value(&json!([reversed]), &EffectiveTime::unbounded(), utc()),
        Err(VirkningError::InvalidRange { .. })
    ));
}

#[test]
fn virkning_annotations_survive_pruning() {
    let document = json!({
        "tilstande": {"organisationgyldighed": [{
            "gyldighed": "Aktiv",
            "virkning": {"from": "1900-01-01", "to": "infinity", "aktoerref": "42",
                         "aktoertypekode": "Bruger", "notetekst": "hi"}
        }]}
    });
    let pruned = prune_value(&document, &EffectiveTime::unbounded(), utc()).unwrap();
    let virkning = &pruned["tilstande"]["organisationgyldighed"][0]["virkning"];
    assert_eq!(virkning["aktoerref"], json!("42"));
    assert_eq!(virkning["aktoertypekode"], json!("Bruger"));
    assert_eq!(virkning["notetekst"], json!("hi"));
    assert_eq!(virkning["to"], json!("infinity"));

    let window = EffectiveTime::half_open(at("1990-01-01"), at("2000-01-01")).unwrap();
    let trimmed = prune_value(&document, &window, utc()).unwrap();
    let virkning = &trimmed["tilstande"]["organisationgyldighed"][0]["virkning"];
    assert_eq!(virkning["from"], json!("1990-01-01T00:00:00+00:00"));
    assert_eq!(virkning["aktoerref"], json!("42"));
}

#[test]
fn slots_are_found_beside_other_keys() {
    let document = json!({
        "tilstande": {
            "organisationgyldighed": [{"gyldighed": "Aktiv", "virkning": virkning("1900-01-01", "1950-01-01")}],
            "note": "x"
        }
    });
    let registration = Registration::from_json(&document).unwrap();
    let section = registration.section("tilstande").unwrap();
    assert_eq!(section.other()["note"], json!("x"));
    assert_eq!(registration.fragment_count(), 1);

    let window = EffectiveTime::half_open(at("1990-01-01"), at("2000-01-01")).unwrap();
    let pruned = prune_value(&document, &window, utc()).unwrap();
    assert_eq!(pruned, json!({"tilstande": {"note": "x"}}));
}
