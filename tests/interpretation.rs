// tests/interpretation.rs
use glam::Vec3;
use symbios_arbor::{LineScene, Segment, Turtle, TurtleConfig, TurtleOp, TurtleState};

fn right_angles() -> TurtleConfig {
    TurtleConfig {
        step_length: 1.0,
        lateral_angle: 90.0,
        yaw_angle: 90.0,
        up_angle: 90.0,
        seed: Some(0),
        ..Default::default()
    }
}

fn setup() -> Turtle<LineScene> {
    Turtle::new(right_angles(), TurtleState::default(), LineScene::new()).unwrap()
}

fn assert_vec(actual: Vec3, expected: Vec3) {
    assert!(
        actual.abs_diff_eq(expected, 1e-5),
        "expected {expected}, got {actual}"
    );
}

fn assert_segment(segment: &Segment, start: Vec3, end: Vec3) {
    assert_vec(segment.start, start);
    assert_vec(segment.end, end);
}

#[test]
fn test_forward_moves_by_step_length() {
    let mut turtle = setup();
    turtle.run("F").unwrap();

    assert_eq!(turtle.segments().len(), 1);
    assert_segment(&turtle.segments()[0], Vec3::ZERO, Vec3::Y);
    assert_vec(turtle.cursor().position, Vec3::Y);
}

#[test]
fn test_consecutive_forwards_merge_into_one_segment() {
    let mut turtle = setup();
    turtle.run("FF").unwrap();

    assert_eq!(turtle.segments().len(), 1, "FF should extend the first segment");
    assert_segment(&turtle.segments()[0], Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0));
}

#[test]
fn test_any_symbol_between_forwards_breaks_the_merge() {
    let mut turtle = setup();
    // 'X' has no turtle meaning but still separates the two moves.
    turtle.run("FXF").unwrap();

    assert_eq!(turtle.segments().len(), 2);
    assert_segment(&turtle.segments()[0], Vec3::ZERO, Vec3::Y);
    assert_segment(&turtle.segments()[1], Vec3::Y, Vec3::new(0.0, 2.0, 0.0));
}

#[test]
fn test_turn_between_forwards() {
    let mut turtle = setup();
    turtle.run("F+F").unwrap();

    // '+' turns +90 degrees around up (+Z): heading +Y becomes -X.
    let segments = turtle.segments();
    assert_eq!(segments.len(), 2);
    assert_segment(&segments[0], Vec3::ZERO, Vec3::Y);
    assert_segment(&segments[1], Vec3::Y, Vec3::new(-1.0, 1.0, 0.0));
    assert_vec(turtle.cursor().heading, Vec3::NEG_X);
    assert_vec(turtle.cursor().up, Vec3::Z);
}

#[test]
fn test_two_branches_and_trunk_continuation() {
    let mut turtle = setup();
    turtle.run("F[+F][-F]F").unwrap();

    let segments = turtle.segments();
    assert_eq!(segments.len(), 4);
    // Trunk
    assert_segment(&segments[0], Vec3::ZERO, Vec3::Y);
    // Branches at +/-90 degrees
    assert_segment(&segments[1], Vec3::Y, Vec3::new(-1.0, 1.0, 0.0));
    assert_segment(&segments[2], Vec3::Y, Vec3::new(1.0, 1.0, 0.0));
    // Trunk resumes from the pre-branch pose
    assert_segment(&segments[3], Vec3::Y, Vec3::new(0.0, 2.0, 0.0));
    assert_eq!(turtle.stack_depth(), 0);
}

#[test]
fn test_empty_branch_is_a_no_op() {
    let mut turtle = setup();
    turtle.run("F+&").unwrap();
    let before = *turtle.cursor();

    turtle.run("[]").unwrap();

    assert_eq!(*turtle.cursor(), before);
    assert_eq!(turtle.stack_depth(), 0);
}

#[test]
fn test_roll_rotates_up_around_heading() {
    let mut turtle = setup();
    turtle.run("/").unwrap();

    assert_vec(turtle.cursor().heading, Vec3::Y);
    assert_vec(turtle.cursor().up, Vec3::X);

    turtle.run("\\\\").unwrap();
    assert_vec(turtle.cursor().up, Vec3::NEG_X);
}

#[test]
fn test_pitch_rotates_around_lateral_axis() {
    let mut turtle = setup();
    // Lateral axis is heading x up = Y x Z = X.
    turtle.run("&").unwrap();

    assert_vec(turtle.cursor().heading, Vec3::Z);
    assert_vec(turtle.cursor().up, Vec3::NEG_Y);

    turtle.run("^").unwrap();
    assert_vec(turtle.cursor().heading, Vec3::Y);
    assert_vec(turtle.cursor().up, Vec3::Z);
}

#[test]
fn test_realign_projects_world_up() {
    let home = TurtleState::new(Vec3::ZERO, Vec3::X, Vec3::Z);
    let mut turtle = Turtle::new(right_angles(), home, LineScene::new()).unwrap();

    turtle.run("$").unwrap();

    assert_vec(turtle.cursor().heading, Vec3::X);
    assert_vec(turtle.cursor().up, Vec3::Y);
}

#[test]
fn test_realign_does_not_normalise() {
    let heading = Vec3::new(1.0, 1.0, 0.0).normalize();
    let home = TurtleState::new(Vec3::ZERO, heading, Vec3::Z);
    let mut turtle = Turtle::new(right_angles(), home, LineScene::new()).unwrap();

    turtle.run("$").unwrap();

    let up = turtle.cursor().up;
    assert!(up.dot(heading).abs() < 1e-5, "up must be orthogonal to heading");
    // |heading|^2 * sin(45 degrees)
    assert!((up.length() - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
}

#[test]
fn test_turns_keep_skewed_frame_skewed() {
    let heading = Vec3::new(1.0, 1.0, 0.0).normalize();
    let up = Vec3::Z + 0.3 * Vec3::Y;
    let home = TurtleState::new(Vec3::ZERO, heading, up);
    let config = TurtleConfig {
        up_angle: 35.0,
        yaw_angle: 50.0,
        lateral_angle: 70.0,
        ..right_angles()
    };
    let mut turtle = Turtle::new(config, home, LineScene::new()).unwrap();

    turtle.run("+/&").unwrap();

    let cursor = turtle.cursor();
    assert!(!cursor.heading.abs_diff_eq(heading, 1e-3));
    // Rigid rotations of both vectors keep their angle and lengths.
    assert!((cursor.heading.dot(cursor.up) - heading.dot(up)).abs() < 1e-5);
    assert!((cursor.up.length() - up.length()).abs() < 1e-5);
    assert!((cursor.up.length() - 1.0).abs() > 0.01);
}

#[test]
fn test_degenerate_axes_skip_rotation() {
    let mut turtle = setup();
    // Heading is parallel to world up, so '$' collapses up to zero.
    turtle.run("$+&F").unwrap();

    assert_vec(turtle.cursor().up, Vec3::ZERO);
    assert_vec(turtle.cursor().heading, Vec3::Y);
    assert_segment(&turtle.segments()[0], Vec3::ZERO, Vec3::Y);
}

#[test]
fn test_leaves_capture_full_pose() {
    let mut turtle = setup();
    turtle.run("FL[+L]").unwrap();

    let leaves = turtle.leaves();
    assert_eq!(leaves.len(), 2);
    assert_vec(leaves[0].position, Vec3::Y);
    assert_vec(leaves[0].heading, Vec3::Y);
    assert_vec(leaves[1].position, Vec3::Y);
    assert_vec(leaves[1].heading, Vec3::NEG_X);
    assert_vec(leaves[1].up, Vec3::Z);
}

#[test]
fn test_unknown_symbols_are_ignored() {
    let mut turtle = setup();
    turtle.run("XYZ 123 !?").unwrap();

    assert!(turtle.segments().is_empty());
    assert_eq!(*turtle.cursor(), TurtleState::default());
}

#[test]
fn test_balanced_strings_leave_empty_stack() {
    let mut turtle = setup();
    for program in ["[]", "F[+F[-F]F]F", "[[[F]]]", "[&FLX]/////[&FLX]/////[&FLX]"] {
        turtle.run(program).unwrap();
        assert_eq!(turtle.stack_depth(), 0, "{program} left branches open");
    }
}

#[test]
fn test_run_ops_matches_run() {
    let mut from_str = setup();
    let mut from_ops = setup();

    from_str.run("F[+F]&F").unwrap();
    from_ops
        .run_ops(&TurtleOp::parse_str("F[+F]&F"))
        .unwrap();

    assert_eq!(from_str.segments(), from_ops.segments());
    assert_eq!(from_str.cursor(), from_ops.cursor());
}
