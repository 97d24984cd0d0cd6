use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use tweenline::{
    AnimateParams, Easing, MemoryDocument, MemoryElement, PlayArguments, Player,
};

/// Suspends once, then resolves; stands in for an awaited microtask inside an
/// instruction body.
#[derive(Default)]
struct YieldOnce {
    polled: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.polled {
            Poll::Ready(())
        } else {
            self.polled = true;
            Poll::Pending
        }
    }
}

fn linear(target: &str, duration: i64) -> AnimateParams {
    AnimateParams::new()
        .target(target)
        .duration(duration)
        .delay(0)
        .release(0)
        .easing(Easing::Linear)
}

#[test]
fn test_awaited_microtask_still_lands_in_the_same_move() {
    let mut doc = MemoryDocument::new();
    let el = doc.add(MemoryElement::div("a"));
    let mut player = Player::new(Rc::new(doc), |a| async move {
        a.group(|g| async move {
            YieldOnce::default().await;
            g.animate(linear("#a", 16).prop("left", ("0px", "16px"))).await;
        })
        .await;
    });

    // the tween scheduled after the await must fire within this same seek
    player.seek(0).unwrap();
    assert_eq!(el.style("left").as_deref(), Some("0px"));

    player.play(PlayArguments::default());
    assert_eq!(player.run_until_done().unwrap(), 16);
    assert_eq!(el.style("left").as_deref(), Some("16px"));
}

#[test]
fn test_unresolvable_selector_skips_but_siblings_proceed() {
    let mut doc = MemoryDocument::new();
    let el = doc.add(MemoryElement::div("a"));
    let mut player = Player::new(Rc::new(doc), |a| async move {
        // resolves immediately without attaching anything
        a.animate(linear("#missing", 16).prop("left", ("0px", "16px"))).await;
        a.animate(linear("#a", 16).prop("left", ("0px", "16px"))).await;
    });

    assert_eq!(player.duration().unwrap(), 16);
    player.seek(16).unwrap();
    assert_eq!(el.style("left").as_deref(), Some("16px"));
}

#[test]
fn test_transform_commit_preserves_siblings() {
    let mut doc = MemoryDocument::new();
    let el = doc.add(MemoryElement::div("a").with_style("transform", "scale(2)"));
    let mut player = Player::new(Rc::new(doc), |a| async move {
        a.animate(linear("#a", 16).prop("translateX", ("0px", "32px"))).await;
    });

    player.play(PlayArguments::default());
    player.run_until_done().unwrap();
    assert_eq!(
        el.style("transform").as_deref(),
        Some("scale(2) translateX(32px)")
    );
}

#[test]
fn test_svg_attribute_animation() {
    let mut doc = MemoryDocument::new();
    let circle = doc.add(MemoryElement::svg("circle", "dot").with_attribute("cx", "10"));
    let mut player = Player::new(Rc::new(doc), |a| async move {
        a.animate(linear("#dot", 32).prop("cx", ("0", "100"))).await;
    });

    player.seek(16).unwrap();
    assert_eq!(circle.attribute("cx").as_deref(), Some("50"));
    player.seek(32).unwrap();
    assert_eq!(circle.attribute("cx").as_deref(), Some("100"));
}

#[test]
fn test_color_interpolation_through_the_engine() {
    let mut doc = MemoryDocument::new();
    let el = doc.add(MemoryElement::div("a").with_style("background-color", "#000000"));
    let mut player = Player::new(Rc::new(doc), |a| async move {
        a.animate(
            linear("#a", 32).prop("background-color", ("#000000", "#808080")),
        )
        .await;
    });

    player.seek(16).unwrap();
    assert_eq!(
        el.style("background-color").as_deref(),
        Some("rgb(64, 64, 64)")
    );
    player.seek(32).unwrap();
    assert_eq!(
        el.style("background-color").as_deref(),
        Some("rgb(128, 128, 128)")
    );
}

#[test]
fn test_mismatched_endpoints_switch_instantly() {
    let mut doc = MemoryDocument::new();
    let el = doc.add(MemoryElement::div("a").with_style("display", "none"));
    let mut player = Player::new(Rc::new(doc), |a| async move {
        a.animate(linear("#a", 32).prop("display", ("none", "block"))).await;
    });

    player.seek(16).unwrap();
    assert_eq!(el.style("display").as_deref(), Some("none"));
    player.seek(32).unwrap();
    assert_eq!(el.style("display").as_deref(), Some("block"));
}

#[test]
fn test_iterate_runs_sequentially_per_target() {
    let mut doc = MemoryDocument::new();
    let first = doc.add(MemoryElement::div("x1").with_class("item").with_style("left", "0px"));
    let second = doc.add(MemoryElement::div("x2").with_class("item").with_style("left", "0px"));
    let third = doc.add(MemoryElement::div("x3").with_class("item").with_style("left", "0px"));

    let mut player = Player::new(Rc::new(doc), |a| async move {
        a.iterate(".item", |g, el, index| async move {
            g.animate(
                AnimateParams::new()
                    .target(el)
                    .duration(16)
                    .easing(Easing::Linear)
                    .prop("left", ("0px", format!("{}px", (index + 1) * 8).as_str())),
            )
            .await;
        })
        .await;
    });

    // three sequential 16 ms groups
    assert_eq!(player.duration().unwrap(), 48);
    player.seek(48).unwrap();
    assert_eq!(first.style("left").as_deref(), Some("8px"));
    assert_eq!(second.style("left").as_deref(), Some("16px"));
    assert_eq!(third.style("left").as_deref(), Some("24px"));
}

#[test]
fn test_repeat_composes_sequential_groups() {
    let mut doc = MemoryDocument::new();
    let _el = doc.add(MemoryElement::div("a").with_style("left", "0px"));
    let mut player = Player::new(Rc::new(doc), |a| async move {
        a.repeat(3, |g, _index| async move {
            g.animate(linear("#a", 16).prop("left", ("0px", "16px"))).await;
        })
        .await;
    });
    assert_eq!(player.duration().unwrap(), 48);
}

#[test]
fn test_function_target_receives_committed_values() {
    use std::cell::RefCell;
    let seen: Rc<RefCell<Vec<(String, String)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();

    let doc = Rc::new(MemoryDocument::new());
    let mut player = Player::new(doc, move |a| async move {
        a.animate(
            AnimateParams::new()
                .target(tweenline::Target::Callback(Rc::new(move |prop, value| {
                    sink.borrow_mut().push((prop.to_string(), value.to_string()));
                })))
                .duration(16)
                .easing(Easing::Linear)
                .prop("gain", (0.0, 1.0)),
        )
        .await;
    });

    player.play(PlayArguments::default());
    player.run_until_done().unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], ("gain".to_string(), "0".to_string()));
    assert_eq!(seen[1], ("gain".to_string(), "1".to_string()));
}
