use std::cell::RefCell;
use std::rc::Rc;

use webgis_map_interaction::app::ScenarioStep;
use webgis_map_interaction::{
    FeatureHit, InMemoryMapEngine, InteractionController, InteractionEvent, InteractionOptions,
    LayerConfig, LayerType, MapEngine, MapFeature, Scenario, Slot, StyleLayer,
};

fn geojson_style(layer_id: &str) -> Vec<StyleLayer> {
    vec![
        StyleLayer::new(format!("geojson-{layer_id}-fill"), "fill")
            .with_source(&format!("{layer_id}-src"), None),
        StyleLayer::new(format!("geojson-{layer_id}-line"), "line")
            .with_source(&format!("{layer_id}-src"), None),
    ]
}

#[test]
fn test_hover_click_clear_flow() {
    let mut controller = InteractionController::default();
    controller
        .manager_mut()
        .engine_mut()
        .add_layer_group("geojson", geojson_style("L1"));

    controller.handle_step(ScenarioStep::Register {
        config: LayerConfig::new("L1", LayerType::Geojson).with_source("L1-src"),
    });
    assert!(
        controller.manager().is_layer_interactive("L1"),
        "Layer sollte nach dem Schritt aufgelöst sein"
    );

    let f1 = MapFeature::with_id(42).property("name", "F1");
    controller.handle_step(ScenarioStep::Hover {
        layer_id: "L1".into(),
        feature: f1.clone(),
        lng_lat: None,
    });
    let features = controller.manager().get_layer_features("L1");
    let state = features.get("feature-42").expect("Feature nach Hover vorhanden");
    assert!(state.is_hovered);
    assert!(!state.is_selected);

    controller.handle_step(ScenarioStep::Click {
        hits: vec![FeatureHit::new(f1, "L1")],
    });
    let features = controller.manager().get_layer_features("L1");
    let state = features.get("feature-42").expect("Feature nach Klick vorhanden");
    assert!(state.is_selected);

    controller.handle_step(ScenarioStep::ClearSelections);
    let features = controller.manager().get_layer_features("L1");
    let state = features.get("feature-42").expect("Feature bleibt nach Clear erhalten");
    assert!(!state.is_selected);

    let events = controller.take_events();
    let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec![
            "layer-registered",
            "feature-hover",
            "feature-click",
            "selections-cleared"
        ]
    );

    match &events[1] {
        InteractionEvent::FeatureHover { feature, .. } => {
            assert_eq!(feature.key, "L1:feature-42");
            assert_eq!(feature.feature_id, "feature-42");
        }
        other => panic!("Unerwartetes Event: {other:?}"),
    }
    match &events[2] {
        InteractionEvent::FeatureClick {
            cleared_features, ..
        } => assert!(cleared_features.is_empty()),
        other => panic!("Unerwartetes Event: {other:?}"),
    }
    match &events[3] {
        InteractionEvent::SelectionsCleared { cleared_features } => {
            assert_eq!(cleared_features.len(), 1);
            assert_eq!(cleared_features[0].key, "L1:feature-42");
        }
        other => panic!("Unerwartetes Event: {other:?}"),
    }
}

#[test]
fn test_same_feature_id_on_two_layers_is_tracked_separately() {
    let mut controller = InteractionController::default();
    {
        let engine = controller.manager_mut().engine_mut();
        engine.add_layer_group("geojson", geojson_style("A"));
        engine.add_layer_group("geojson", geojson_style("B"));
    }
    for id in ["A", "B"] {
        controller.handle_step(ScenarioStep::Register {
            config: LayerConfig::new(id, LayerType::Geojson).with_source(format!("{id}-src")),
        });
    }
    let feature = MapFeature::with_id(7);
    controller.handle_step(ScenarioStep::Click {
        hits: vec![
            FeatureHit::new(feature.clone(), "A"),
            FeatureHit::new(feature, "B"),
        ],
    });

    let selected: Vec<String> = controller
        .manager()
        .selected_features()
        .into_iter()
        .map(|f| f.key)
        .collect();
    assert_eq!(selected, vec!["A:feature-7", "B:feature-7"]);
    assert!(controller.manager().store().selection_is_consistent());

    // Schließen per Feature-ID trifft nur die erste passende Selektion
    controller.handle_step(ScenarioStep::CloseSelected {
        feature_id: "feature-7".into(),
    });
    assert_eq!(controller.manager().selected_features().len(), 1);
}

#[test]
fn test_raster_groups_render_below_vector_groups() {
    let mut engine = InMemoryMapEngine::new();
    let vector_slot = engine.add_layer_group("geojson", geojson_style("plots"));
    let raster_slot = engine.add_layer_group(
        "tms",
        vec![StyleLayer::new("tms-layer-sat", "raster").with_source("sat", None)],
    );
    assert_eq!(vector_slot, Slot::Middle);
    assert_eq!(raster_slot, Slot::Bottom);

    assert_eq!(
        engine.render_order(),
        vec!["tms-layer-sat", "geojson-plots-fill", "geojson-plots-line"]
    );

    let ids: Vec<String> = engine.style_layers().into_iter().map(|l| l.id).collect();
    assert_eq!(ids, engine.render_order());
}

#[test]
fn test_style_reload_keeps_selection() {
    let mut controller = InteractionController::default();
    let scenario = Scenario::from_json_str(
        r#"{
          "style": [ { "layerType": "geojson", "layers": [
            { "id": "geojson-L1-fill", "type": "fill", "source": "L1-src" } ] } ],
          "steps": [
            { "action": "register", "config": { "id": "L1", "type": "geojson", "source": "L1-src" } },
            { "action": "click", "hits": [ { "layerId": "L1", "feature": { "id": 3 } } ] },
            { "action": "style-reload", "style": [ { "layerType": "geojson", "layers": [
              { "id": "geojson-L1-fill", "type": "fill", "source": "L1-src" } ] } ] }
          ]
        }"#,
    )
    .expect("Szenario sollte gültig sein");

    controller.run(scenario);
    let manager = controller.manager();
    assert!(manager.is_layer_interactive("L1"));
    assert_eq!(manager.selected_features().len(), 1);
    assert_eq!(manager.engine().feature_state_count(), 1);
}

#[test]
fn test_demo_scenario_runs_to_completion() {
    let scenario = Scenario::demo().expect("Demo-Szenario sollte gültig sein");
    let mut controller = InteractionController::new(InteractionOptions::default());
    let events = controller.run(scenario);

    let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec![
            "layer-registered",
            "layer-registered",
            "layer-registered",
            "feature-hover",
            "feature-click",
            "feature-click-multiple",
            "feature-deselected",
            "map-mouse-leave",
            "selections-cleared",
        ]
    );
    assert!(controller.manager().is_layer_interactive("villages"));
    assert!(controller.manager().selected_features().is_empty());
    assert!(controller.manager().hovered_features().is_empty());

    controller.manager_mut().dispose();
    assert_eq!(controller.manager().engine().listener_count(), 0);
}

#[test]
fn test_events_serialize_as_tagged_json() {
    let mut controller = InteractionController::default();
    controller
        .manager_mut()
        .engine_mut()
        .add_layer_group("geojson", geojson_style("L1"));
    controller.handle_step(ScenarioStep::Register {
        config: LayerConfig::new("L1", LayerType::Geojson),
    });
    controller.handle_step(ScenarioStep::MouseLeave);

    let json: Vec<serde_json::Value> = controller
        .take_events()
        .iter()
        .map(|e| serde_json::to_value(e).expect("Event sollte serialisierbar sein"))
        .collect();
    assert_eq!(json[0]["type"], "layer-registered");
    assert_eq!(json[0]["layerId"], "L1");
    assert_eq!(json[0]["config"]["type"], "geojson");
    assert_eq!(json[1]["type"], "map-mouse-leave");
    assert_eq!(json[1]["cleared"], serde_json::json!([]));
}

#[test]
fn test_filtered_subscription_only_sees_its_event() {
    let mut controller = InteractionController::default();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    controller
        .manager_mut()
        .events_mut()
        .subscribe_to("map-mouse-leave", move |e| sink.borrow_mut().push(e.name()));

    controller.handle_step(ScenarioStep::Register {
        config: LayerConfig::new("L1", LayerType::Geojson),
    });
    controller.handle_step(ScenarioStep::MouseLeave);
    controller.handle_step(ScenarioStep::MouseLeave);

    assert_eq!(*seen.borrow(), vec!["map-mouse-leave", "map-mouse-leave"]);
}
