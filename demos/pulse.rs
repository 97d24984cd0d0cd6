//! A pulsing dot: a nested sub-player runs a scale animation forward and
//! backward over three cycles, with the backward leg at double speed.

use std::rc::Rc;
use tweenline::{
    AnimateParams, Easing, MemoryDocument, MemoryElement, PlayParams, Player,
};

fn main() {
    let mut doc = MemoryDocument::new();
    let el = doc.add(MemoryElement::div("dot").with_style("transform", "translateX(40px) scale(1)"));

    let mut player = Player::new(Rc::new(doc), |a| async move {
        a.play(
            PlayParams::new().times(3).alternate(true).back_speed(2.0),
            |p| async move {
                p.animate(
                    AnimateParams::new()
                        .target("#dot")
                        .duration(160)
                        .easing(Easing::OutQuad)
                        .prop("scale", ("1", "1.6")),
                )
                .await;
            },
        )
        .await;
    });

    let total = player.duration().expect("duration probe failed");
    println!("total duration: {} ms", total);

    for t in (0..=total).step_by(48) {
        player.seek(t).expect("seek failed");
        println!("t={:>4} ms  transform={}", t, el.style("transform").unwrap_or_default());
    }

    player.seek(0).expect("seek failed");
    println!("rewound: transform={}", el.style("transform").unwrap_or_default());
}
