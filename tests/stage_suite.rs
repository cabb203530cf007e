use std::path::Path;
use std::time::Duration;

use flowstage::layout_dump::LayoutDump;
use flowstage::{
    Axis, RenderOptions, Scene, Size, StageError, play_scene, render_with_options,
};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).expect("fixture read failed")
}

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

#[test]
fn render_all_fixtures() {
    let candidates = ["straight.json", "vertical.json", "dangling.json", "oauth.json"];
    for name in candidates {
        let svg = render_with_options(&fixture(name), &RenderOptions::default())
            .unwrap_or_else(|err| panic!("{name}: {err}"));
        assert_valid_svg(&svg, name);
        let light = render_with_options(&fixture(name), &RenderOptions::light())
            .unwrap_or_else(|err| panic!("{name}: {err}"));
        assert_valid_svg(&light, name);
    }
}

#[test]
fn horizontal_pair_routes_east_to_west() {
    let scene = Scene::from_json(&fixture("straight.json")).unwrap();
    let player = play_scene(scene, &RenderOptions::default()).unwrap();
    let path = player.stage().path("ab").expect("edge should be routed");
    assert_eq!(path.d, "M 100 50 L 200 50 L 200 50 L 300 50");
    assert_eq!(path.axis, Axis::Horizontal);
    assert!((path.label_position.x - 200.0).abs() < 1e-3);
    assert!((path.label_position.y - 42.0).abs() < 1e-3);

    let svg = player.render_svg();
    assert!(svg.contains("M 100 50 L 200 50 L 200 50 L 300 50"));
    assert!(svg.contains("arrowhead-ab"));
    assert!(svg.contains(">request</text>"));
}

#[test]
fn stacked_pair_routes_south_to_north() {
    let scene = Scene::from_json(&fixture("vertical.json")).unwrap();
    let player = play_scene(scene, &RenderOptions::default()).unwrap();
    let path = player.stage().path("ab").expect("edge should be routed");
    assert_eq!(path.axis, Axis::Vertical);
    assert_eq!(path.d, "M 50 100 L 50 200 L 50 200 L 50 300");
}

#[test]
fn edge_to_unknown_node_is_omitted() {
    let scene = Scene::from_json(&fixture("dangling.json")).unwrap();
    let player = play_scene(scene, &RenderOptions::default()).unwrap();
    assert!(player.stage().path("ab").is_some());
    assert!(player.stage().path("ac").is_none());

    let svg = player.render_svg();
    assert!(svg.contains("data-edge-id=\"ab\""));
    assert!(!svg.contains("data-edge-id=\"ac\""));
    assert!(!svg.contains(">lost</text>"));

    let dump = LayoutDump::from_frame(&player.frame());
    let dangling = dump.edges.iter().find(|edge| edge.id == "ac").unwrap();
    assert!(!dangling.routed);
    assert!(dangling.path.is_none());
}

#[test]
fn stage_scale_fits_the_viewport() {
    let scene = Scene::from_json(&fixture("straight.json")).unwrap();
    let options = RenderOptions {
        viewport: Size::new(1920.0, 600.0),
        ..RenderOptions::default()
    };
    let player = play_scene(scene, &options).unwrap();
    let scale = player.stage().scale();
    assert!(scale > 0.0 && scale.is_finite());
    assert!(1280.0 * scale <= 1920.0);
    assert!(720.0 * scale <= 600.0);
    assert!(player.render_svg().contains("scale("));
}

#[test]
fn steps_control_visible_edges() {
    let scene = Scene::from_json(&fixture("oauth.json")).unwrap();

    let idle = play_scene(scene.clone(), &RenderOptions::default()).unwrap();
    assert_eq!(idle.step_name(), Some("idle"));
    assert!(idle.stage().paths().is_empty());

    let options = RenderOptions {
        step: Some(1),
        ..RenderOptions::default()
    };
    let request = play_scene(scene, &options).unwrap();
    assert_eq!(request.step_name(), Some("auth_request"));
    assert_eq!(
        request.caption(),
        Some("Client redirects to the authorization server")
    );
    let routed: Vec<&str> = request.stage().paths().keys().map(String::as_str).collect();
    assert_eq!(routed, vec!["login", "authorize"]);
    assert!(request.stage().is_animating());
    assert!(request.render_svg().contains("stroke-dasharray=\"8,4\""));
}

#[test]
fn timed_step_moves_on_during_elapsed_time() {
    let scene = Scene::from_json(&fixture("oauth.json")).unwrap();
    let early = RenderOptions {
        step: Some(2),
        elapsed: Some(Duration::from_millis(500)),
        ..RenderOptions::default()
    };
    let player = play_scene(scene.clone(), &early).unwrap();
    assert_eq!(player.step_name(), Some("code_received"));
    assert!(player.render_svg().contains("<circle"));

    let late = RenderOptions {
        step: Some(2),
        elapsed: Some(Duration::from_millis(900)),
        ..RenderOptions::default()
    };
    let player = play_scene(scene, &late).unwrap();
    assert_eq!(player.step_name(), Some("token_exchange"));
    assert!(player.stage().path("code").is_none());
    assert!(player.stage().path("token").is_some());
}

#[test]
fn bad_step_reference_is_rejected() {
    let input = r#"{
        "nodes": [{"id": "A", "x": 0, "y": 0}],
        "edges": [],
        "steps": [{"name": "one", "show": ["missing"]}]
    }"#;
    let err = render_with_options(input, &RenderOptions::default()).unwrap_err();
    assert!(matches!(err, StageError::UnknownEdge { ref edge, .. } if edge == "missing"));
}

#[test]
fn malformed_scene_is_a_parse_error() {
    let err = render_with_options("{ nodes: ", &RenderOptions::default()).unwrap_err();
    assert!(matches!(err, StageError::SceneParse(_)));
}
