//! Multi-selection alignment.

use pd_core::geometry::{Bounds, format_px};
use pd_core::model::Node;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    /// Horizontal centre.
    Center,
    Right,
    Top,
    /// Vertical centre.
    Middle,
    Bottom,
}

/// Align `nodes` against their common bounding box.
///
/// Only `left` (horizontal alignments) or `top` (vertical ones) is rewritten.
/// Fewer than two nodes is a no-op; returns whether anything was aligned.
pub fn align_nodes(nodes: &mut [&mut Node], alignment: Alignment) -> bool {
    if nodes.len() < 2 {
        return false;
    }
    let rects: Vec<Bounds> = nodes.iter().map(|n| Bounds::of_style(&n.style)).collect();
    let Some(group) = rects.iter().copied().reduce(|a, b| a.union(&b)) else {
        return false;
    };

    for (node, rect) in nodes.iter_mut().zip(&rects) {
        let (key, value) = match alignment {
            Alignment::Left => ("left", group.left),
            Alignment::Right => ("left", group.right - rect.width()),
            Alignment::Center => ("left", (group.left + group.right) / 2.0 - rect.width() / 2.0),
            Alignment::Top => ("top", group.top),
            Alignment::Bottom => ("top", group.bottom - rect.height()),
            Alignment::Middle => ("top", (group.top + group.bottom) / 2.0 - rect.height() / 2.0),
        };
        node.style.insert(key.into(), format_px(value).into());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::id::NodeId;
    use pd_core::model::NodeKind;
    use serde_json::json;

    fn boxed(id: &str, left: f64, top: f64, w: f64, h: f64) -> Node {
        let mut n = Node::new(NodeId::intern(id), NodeKind::Container);
        n.style = json!({
            "left": format_px(left),
            "top": format_px(top),
            "width": format_px(w),
            "height": format_px(h)
        })
        .as_object()
        .unwrap()
        .clone();
        n
    }

    fn run(alignment: Alignment) -> (Node, Node) {
        let mut a = boxed("al_a", 10.0, 40.0, 100.0, 20.0);
        let mut b = boxed("al_b", 200.0, 0.0, 50.0, 80.0);
        assert!(align_nodes(&mut [&mut a, &mut b], alignment));
        (a, b)
    }

    #[test]
    fn horizontal() {
        let (a, b) = run(Alignment::Left);
        assert_eq!(a.style["left"], json!("10px"));
        assert_eq!(b.style["left"], json!("10px"));

        let (a, b) = run(Alignment::Right);
        assert_eq!(a.style["left"], json!("150px"));
        assert_eq!(b.style["left"], json!("200px"));

        // Group spans 10..250 → centre 130.
        let (a, b) = run(Alignment::Center);
        assert_eq!(a.style["left"], json!("80px"));
        assert_eq!(b.style["left"], json!("105px"));
        assert_eq!(a.style["top"], json!("40px"));
    }

    #[test]
    fn vertical() {
        let (a, b) = run(Alignment::Top);
        assert_eq!(a.style["top"], json!("0px"));
        assert_eq!(b.style["top"], json!("0px"));

        let (a, b) = run(Alignment::Bottom);
        assert_eq!(a.style["top"], json!("60px"));
        assert_eq!(b.style["top"], json!("0px"));

        let (a, _) = run(Alignment::Middle);
        assert_eq!(a.style["top"], json!("30px"));
    }

    #[test]
    fn single_node_is_untouched() {
        let mut a = boxed("al_solo", 10.0, 40.0, 100.0, 20.0);
        assert!(!align_nodes(&mut [&mut a], Alignment::Right));
        assert_eq!(a.style["left"], json!("10px"));
    }
}
