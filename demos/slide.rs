//! Slide a box to the right, then fade it out.
//!
//! Runs against the in-memory document and prints every painted frame.

use std::rc::Rc;
use tweenline::{AnimateParams, Easing, MemoryDocument, MemoryElement, PlayArguments, Player};

fn main() {
    let mut doc = MemoryDocument::new();
    let el = doc.add(
        MemoryElement::div("box")
            .with_style("left", "0px")
            .with_style("opacity", "1"),
    );

    let mut player = Player::new(Rc::new(doc), |a| async move {
        a.animate(
            AnimateParams::new()
                .target("#box")
                .duration(160)
                .easing(Easing::OutCubic)
                .prop("left", ("0px", "320px")),
        )
        .await;
        a.animate(
            AnimateParams::new()
                .target("#box")
                .duration(96)
                .easing(Easing::Linear)
                .prop("opacity", ("1", "0")),
        )
        .await;
    });

    let watched = el.clone();
    player.play(PlayArguments::new().on_update(move |t| {
        println!(
            "t={:>4} ms  left={:<8} opacity={}",
            t,
            watched.style("left").unwrap_or_default(),
            watched.style("opacity").unwrap_or_default(),
        );
    }));

    let end = player.run_until_done().expect("playback failed");
    println!(
        "finished at {} ms: left={:?}, opacity={:?}",
        end,
        el.style("left"),
        el.style("opacity")
    );
}
