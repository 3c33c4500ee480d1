// tests/symbios_state.rs
use glam::Vec3;
use symbios::{SymbiosState, SymbolTable};
use symbios_arbor::{LineScene, Turtle, TurtleConfig, TurtleOp, TurtleState};

fn setup() -> (Turtle<LineScene>, SymbolTable) {
    let mut interner = SymbolTable::new();
    let config = TurtleConfig {
        step_length: 1.0,
        up_angle: 90.0,
        seed: Some(0),
        ..Default::default()
    };
    let mut turtle = Turtle::new(config, TurtleState::default(), LineScene::new()).unwrap();

    // Intern symbols, including one the turtle has no meaning for
    for sym in ["X", "F", "+", "-", "[", "]", "%"] {
        interner.intern(sym).unwrap();
    }
    turtle.populate_standard_symbols(&interner);

    (turtle, interner)
}

fn derive(interner: &SymbolTable, program: &str) -> SymbiosState {
    let mut state = SymbiosState::new();
    for c in program.chars() {
        let id = interner.resolve_id(&c.to_string()).unwrap();
        state.push(id, 0.0, &[]).unwrap();
    }
    state
}

#[test]
fn test_state_matches_string_interpretation() {
    let (mut turtle, interner) = setup();

    // Grammar output: X F [ + F ] [ - F ] F
    let state = derive(&interner, "XF[+F][-F]F");
    turtle.run_state(&state).unwrap();

    let segments = turtle.segments();
    assert_eq!(segments.len(), 4);
    assert!(segments[1].end.abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), 1e-5));
    assert!(segments[2].end.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    assert!(segments[3].end.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    assert_eq!(turtle.emitter().len(), 4);
}

#[test]
fn test_prune_over_symbols() {
    let (mut turtle, interner) = setup();

    let state = derive(&interner, "F[F%FF]F");
    turtle.run_state(&state).unwrap();

    assert_eq!(turtle.segments().len(), 3);
    assert_eq!(turtle.stack_depth(), 0);
}

#[test]
fn test_custom_symbol_binding() {
    let (mut turtle, interner) = setup();
    let x = interner.resolve_id("X").unwrap();

    // Unbound: 'X' is ignored
    turtle.run_state(&derive(&interner, "XX")).unwrap();
    assert!(turtle.segments().is_empty());

    // Bound: 'X' draws like 'F'
    turtle.set_op(x, TurtleOp::Forward);
    turtle.run_state(&derive(&interner, "XX")).unwrap();
    assert_eq!(turtle.segments().len(), 1);
    assert!(turtle.cursor().position.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
}

#[test]
fn test_with_map_replaces_bindings() {
    let (turtle, interner) = setup();
    let f = interner.resolve_id("F").unwrap();

    // An empty map leaves every symbol unbound.
    let mut turtle = turtle.with_map(Vec::new());
    turtle.run_state(&derive(&interner, "FF")).unwrap();
    assert!(turtle.segments().is_empty());

    let mut map = vec![TurtleOp::Ignore; f as usize + 1];
    map[f as usize] = TurtleOp::Forward;
    let mut turtle = turtle.with_map(map);
    turtle.run_state(&derive(&interner, "F")).unwrap();
    assert_eq!(turtle.segments().len(), 1);
}
