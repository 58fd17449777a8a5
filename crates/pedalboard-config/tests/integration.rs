//! Integration tests for boards, presets and the registry working together.

use std::cell::RefCell;
use std::rc::Rc;

use pedalboard_config::{
    Board, BoardEvent, BoardPreset, ConfigError, FACTORY_PRESET_NAMES, PedalPreset,
    get_factory_preset,
};
use pedalboard_core::{AudioHost, SignalGraph};
use pedalboard_effects::EffectUnit;
use pedalboard_registry::PedalRegistry;
use proptest::prelude::*;

const RATE: f32 = 8000.0;

fn board_with(graph: &mut SignalGraph, registry: &PedalRegistry, names: &[&str]) -> Board {
    let mut board = Board::new(graph);
    let out = graph.destination();
    board.connect(graph, out);
    for name in names {
        let pedal = registry.create(graph, name).unwrap();
        board.add_pedal(graph, pedal);
    }
    board
}

fn names(board: &Board) -> Vec<&str> {
    board.pedals().iter().map(EffectUnit::name).collect()
}

/// Pedals are wired input → p0 → … → pN → output in sequence order.
fn assert_wired_in_order(graph: &SignalGraph, board: &Board) {
    let pedals = board.pedals();
    match pedals.first() {
        None => assert!(graph.is_connected(board.input(), board.output())),
        Some(first) => {
            assert!(graph.is_connected(board.input(), first.input()));
            assert!(!graph.is_connected(board.input(), board.output()));
        }
    }
    for pair in pedals.windows(2) {
        assert!(graph.is_connected(pair[0].output(), pair[1].input()));
        assert!(graph.reachable(pair[0].input(), pair[1].input()));
        assert!(!graph.reachable(pair[1].input(), pair[0].input()));
    }
    if let Some(last) = pedals.last() {
        assert!(graph.is_connected(last.output(), board.output()));
    }
    if let Some(next) = board.downstream() {
        assert!(graph.is_connected(board.output(), next));
    }
}

#[test]
fn test_move_pedal_rewires_in_new_order() {
    let mut graph = SignalGraph::new(RATE);
    let registry = PedalRegistry::new();
    let mut board = board_with(&mut graph, &registry, &["overdrive", "delay"]);

    assert!(board.move_pedal(&mut graph, 1, 0));
    assert_eq!(names(&board), ["delay", "overdrive"]);

    // Both pedals start bypassed, so the path runs through their shells only.
    let delay = &board.pedals()[0];
    let overdrive = &board.pedals()[1];
    let path = graph.linear_path(board.input(), board.output()).unwrap();
    assert_eq!(
        path,
        vec![
            board.input(),
            delay.input(),
            delay.output(),
            overdrive.input(),
            overdrive.output(),
            board.output(),
        ]
    );
}

#[test]
fn test_removing_last_pedal_restores_direct_path() {
    let mut graph = SignalGraph::new(RATE);
    let registry = PedalRegistry::new();
    let mut board = board_with(&mut graph, &registry, &["reverb"]);

    let removed = board.remove_pedal_at(&mut graph, 0).unwrap();
    assert_eq!(removed.name(), "reverb");
    assert!(!removed.is_disposed());
    assert!(board.is_empty());
    assert!(graph.is_connected(board.input(), board.output()));
    assert!(graph.successors(removed.output()).is_empty());
}

#[test]
fn test_serialize_snapshot() {
    let mut graph = SignalGraph::new(RATE);
    let registry = PedalRegistry::new();
    let mut board = board_with(&mut graph, &registry, &["overdrive", "volume"]);
    board.pedal_at_mut(0).unwrap().set_bypass(&mut graph, false);

    let preset = board.serialize();
    assert_eq!(preset.name, None);
    assert_eq!(preset.pedals.len(), 2);

    let overdrive = &preset.pedals[0];
    assert_eq!(overdrive.name, "overdrive");
    assert!(!overdrive.bypassed);
    assert!((overdrive.pot("drive").unwrap() - 4.0).abs() < 1e-3);
    assert!((overdrive.pot("tone").unwrap() - 7.0).abs() < 1e-3);
    assert_eq!(overdrive.pot("level"), Some(10.0));

    let volume = &preset.pedals[1];
    assert_eq!(volume.name, "volume");
    assert!(!volume.bypassed);
    assert_eq!(volume.pot("level"), Some(10.0));
}

#[test]
fn test_serialize_deserialize_round_trip() {
    let mut graph = SignalGraph::new(RATE);
    let registry = PedalRegistry::new();
    let mut board = board_with(&mut graph, &registry, &["delay", "cabinet", "overdrive"]);
    {
        let delay = board.pedal_at_mut(0).unwrap();
        delay.set_pot(&mut graph, "time", 0.75);
        delay.set_pot(&mut graph, "feedback", 0.5);
        delay.set_bypass(&mut graph, false);
    }
    board.pedal_at_mut(1).unwrap().set_pot(&mut graph, "cabinet", 1.0);
    board.pedal_at_mut(2).unwrap().set_pot(&mut graph, "drive", 6.5);
    let saved = board.serialize();

    let mut other_graph = SignalGraph::new(RATE);
    let mut restored = Board::new(&mut other_graph);
    let report = restored
        .deserialize(&mut other_graph, &saved, &registry)
        .unwrap();
    assert_eq!(report.loaded, 3);
    assert!(report.skipped.is_empty());

    let again = restored.serialize();
    assert_eq!(again.pedals.len(), saved.pedals.len());
    for (a, b) in saved.pedals.iter().zip(&again.pedals) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.bypassed, b.bypassed);
        assert_eq!(a.pots.len(), b.pots.len());
        for (pa, pb) in a.pots.iter().zip(&b.pots) {
            assert_eq!(pa.name, pb.name);
            assert!(
                (pa.value - pb.value).abs() < 1e-3,
                "{}.{}: {} vs {}",
                a.name,
                pa.name,
                pa.value,
                pb.value
            );
        }
    }
    assert_wired_in_order(&other_graph, &restored);
}

#[test]
fn test_unknown_pedal_is_skipped() {
    let mut graph = SignalGraph::new(RATE);
    let registry = PedalRegistry::new();
    let mut board = Board::new(&mut graph);
    let preset = BoardPreset::default()
        .with_pedal(PedalPreset::new("overdrive", false))
        .with_pedal(PedalPreset::new("wah", false))
        .with_pedal(PedalPreset::new("volume", false));

    let report = board.deserialize(&mut graph, &preset, &registry).unwrap();
    assert_eq!(report.loaded, 2);
    assert_eq!(report.skipped, ["wah"]);
    assert_eq!(names(&board), ["overdrive", "volume"]);
    assert_wired_in_order(&graph, &board);
}

#[test]
fn test_invalid_document_leaves_board_untouched() {
    let mut graph = SignalGraph::new(RATE);
    let registry = PedalRegistry::new();
    let mut board = board_with(&mut graph, &registry, &["delay", "volume"]);
    let edges_before = graph.edges().to_vec();

    let err = board
        .load_json(&mut graph, r#"{ "pedals": [ { "name": "reverb" } ] }"#, &registry)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));

    let blank = BoardPreset::default().with_pedal(PedalPreset::new("", true));
    let err = board.deserialize(&mut graph, &blank, &registry).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));

    assert_eq!(names(&board), ["delay", "volume"]);
    assert_eq!(graph.edges(), edges_before.as_slice());
}

#[test]
fn test_load_replaces_and_disposes_previous_pedals() {
    let mut graph = SignalGraph::new(RATE);
    let registry = PedalRegistry::new();
    let mut board = board_with(&mut graph, &registry, &["reverb"]);
    let old_input = board.pedals()[0].input();

    let preset = get_factory_preset("clean").unwrap();
    board.deserialize(&mut graph, &preset, &registry).unwrap();

    assert!(graph.is_released(old_input));
    assert_eq!(names(&board), ["overdrive", "delay", "reverb", "volume"]);
}

#[test]
fn test_custom_source_closure() {
    let mut graph = SignalGraph::new(RATE);
    let registry = PedalRegistry::new();
    let mut board = Board::new(&mut graph);
    let only_volume = |host: &mut dyn AudioHost, name: &str| {
        (name == "volume").then(|| registry.create(host, name)).flatten()
    };
    let preset = BoardPreset::default()
        .with_pedal(PedalPreset::new("overdrive", false))
        .with_pedal(PedalPreset::new("volume", false).with_pot("level", 3.0));

    let report = board.deserialize(&mut graph, &preset, &only_volume).unwrap();
    assert_eq!(report.skipped, ["overdrive"]);
    assert_eq!(board.pedals()[0].level(), 3.0);
}

#[test]
fn test_every_factory_preset_loads() {
    let registry = PedalRegistry::new();
    for name in FACTORY_PRESET_NAMES {
        let mut graph = SignalGraph::new(RATE);
        let mut board = Board::new(&mut graph);
        let out = graph.destination();
        board.connect(&mut graph, out);

        let preset = get_factory_preset(name).unwrap();
        let report = board.deserialize(&mut graph, &preset, &registry).unwrap();
        assert_eq!(report.loaded, preset.len(), "{name}");
        assert!(report.skipped.is_empty(), "{name}");
        for (pedal, entry) in board.pedals().iter().zip(&preset.pedals) {
            assert_eq!(pedal.is_bypassed(), entry.bypassed, "{name}: {}", entry.name);
        }
        assert!(graph.reachable(board.input(), out), "{name}");
    }
}

#[test]
fn test_preset_loaded_event_follows_topology_change() {
    let mut graph = SignalGraph::new(RATE);
    let registry = PedalRegistry::new();
    let mut board = Board::new(&mut graph);
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    board.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let preset = get_factory_preset("ambient").unwrap();
    board.deserialize(&mut graph, &preset, &registry).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            BoardEvent::TopologyChanged,
            BoardEvent::PresetLoaded {
                loaded: 3,
                skipped: Vec::new(),
            },
        ]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn board_stays_wired_in_order(
        picks in prop::collection::vec(0usize..5, 0..6),
        moves in prop::collection::vec((0usize..6, 0usize..6), 0..6),
        engaged in prop::collection::vec(any::<bool>(), 6),
    ) {
        const NAMES: [&str; 5] = ["overdrive", "delay", "reverb", "cabinet", "volume"];
        let mut graph = SignalGraph::new(RATE);
        let registry = PedalRegistry::new();
        let chosen: Vec<&str> = picks.iter().map(|&i| NAMES[i]).collect();
        let mut board = board_with(&mut graph, &registry, &chosen);

        for (i, &on) in engaged.iter().enumerate() {
            if let Some(pedal) = board.pedal_at_mut(i) {
                pedal.set_bypass(&mut graph, !on);
            }
        }
        for (from, to) in moves {
            let before: Vec<String> = names(&board).iter().map(|s| s.to_string()).collect();
            let moved = board.move_pedal(&mut graph, from, to);
            prop_assert_eq!(moved, from < before.len() && to < before.len());
        }

        assert_wired_in_order(&graph, &board);
        prop_assert!(graph.reachable(board.input(), graph.destination()));
    }
}
