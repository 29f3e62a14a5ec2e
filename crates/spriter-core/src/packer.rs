//! Growing binary-split rectangle packer.
//!
//! Rectangles are processed in caller order and placed into a binary tree of
//! free/occupied regions: the first free node that fits is split into an
//! occupied area plus bottom and right remainders. When nothing fits, the
//! sheet grows to the right or downward, whichever keeps the enclosing box
//! closer to square. Placement is a pure function of the input sequence, so
//! the same rectangles always pack to the same positions.
//!
//! The reported sheet size is the tight bounding box of the placements, not
//! the internal tree extent, so growth never leaves an unused border.

/// Position assigned to one input rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
}

/// Result of packing: one placement per input rectangle, in input order,
/// plus the tight enclosing sheet size.
#[derive(Debug, Clone)]
pub struct PackedSheet {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

/// Pack `(width, height)` rectangles into non-overlapping positions.
///
/// Zero rectangles produce a zero-size sheet. Rectangles larger than the
/// current sheet extent grow the sheet rather than fail.
pub fn pack(rects: &[(u32, u32)]) -> PackedSheet {
    let mut tree = Tree::default();
    let placements: Vec<Placement> = rects.iter().map(|&(w, h)| tree.insert(w, h)).collect();

    let mut width = 0;
    let mut height = 0;
    for (&(w, h), placement) in rects.iter().zip(&placements) {
        width = width.max(placement.x + w);
        height = height.max(placement.y + h);
    }
    PackedSheet {
        width,
        height,
        placements,
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    used: bool,
    right: Option<usize>,
    down: Option<usize>,
}

impl Node {
    fn free(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            right: None,
            down: None,
        }
    }
}

#[derive(Debug, Default)]
struct Tree {
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl Tree {
    fn insert(&mut self, w: u32, h: u32) -> Placement {
        let Some(root) = self.root else {
            // First rectangle seeds the sheet at its own size.
            self.nodes.push(Node::free(0, 0, w, h));
            self.root = Some(0);
            return self.split(0, w, h);
        };

        match self.find(root, w, h) {
            Some(index) => self.split(index, w, h),
            None => {
                let index = self.grow(root, w, h);
                self.split(index, w, h)
            }
        }
    }

    /// Depth-first search for the first free node that fits.
    fn find(&self, index: usize, w: u32, h: u32) -> Option<usize> {
        let node = self.nodes[index];
        if node.used {
            if let Some(right) = node.right {
                if let Some(found) = self.find(right, w, h) {
                    return Some(found);
                }
            }
            if let Some(down) = node.down {
                return self.find(down, w, h);
            }
            return None;
        }
        (w <= node.w && h <= node.h).then_some(index)
    }

    /// Mark a free node occupied, carving bottom and right remainders.
    fn split(&mut self, index: usize, w: u32, h: u32) -> Placement {
        let node = self.nodes[index];
        let down = Node::free(node.x, node.y + h, node.w, node.h - h);
        let right = Node::free(node.x + w, node.y, node.w - w, h);

        self.nodes.push(down);
        let down_index = self.nodes.len() - 1;
        self.nodes.push(right);
        let right_index = self.nodes.len() - 1;

        let node = &mut self.nodes[index];
        node.used = true;
        node.down = Some(down_index);
        node.right = Some(right_index);
        Placement {
            x: node.x,
            y: node.y,
        }
    }

    /// Extend the sheet right or down, returning the new free node's index.
    fn grow(&mut self, root: usize, w: u32, h: u32) -> usize {
        let (root_w, root_h) = (self.nodes[root].w, self.nodes[root].h);

        // Candidate extents for each direction; pick whichever stays closer
        // to square, preferring rightward growth on a tie.
        let right_extent = (root_w + w, root_h.max(h));
        let down_extent = (root_w.max(w), root_h + h);
        let grow_right =
            right_extent.0.max(right_extent.1) <= down_extent.0.max(down_extent.1);

        let (new_w, new_h) = if grow_right { right_extent } else { down_extent };
        let free = if grow_right {
            Node::free(root_w, 0, w, new_h)
        } else {
            Node::free(0, root_h, new_w, h)
        };
        self.nodes.push(free);
        let free_index = self.nodes.len() - 1;

        let new_root = Node {
            x: 0,
            y: 0,
            w: new_w,
            h: new_h,
            used: true,
            right: if grow_right { Some(free_index) } else { Some(root) },
            down: if grow_right { Some(root) } else { Some(free_index) },
        };
        self.nodes.push(new_root);
        self.root = Some(self.nodes.len() - 1);
        free_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: (Placement, (u32, u32)), b: (Placement, (u32, u32))) -> bool {
        let (pa, (wa, ha)) = a;
        let (pb, (wb, hb)) = b;
        pa.x < pb.x + wb && pb.x < pa.x + wa && pa.y < pb.y + hb && pb.y < pa.y + ha
    }

    fn assert_no_overlaps(rects: &[(u32, u32)], sheet: &PackedSheet) {
        for i in 0..rects.len() {
            for j in (i + 1)..rects.len() {
                assert!(
                    !overlaps(
                        (sheet.placements[i], rects[i]),
                        (sheet.placements[j], rects[j])
                    ),
                    "rectangles {i} and {j} overlap: {:?} {:?}",
                    sheet.placements[i],
                    sheet.placements[j]
                );
            }
        }
    }

    fn assert_tight_bounds(rects: &[(u32, u32)], sheet: &PackedSheet) {
        let width = rects
            .iter()
            .zip(&sheet.placements)
            .map(|(&(w, _), p)| p.x + w)
            .max()
            .unwrap_or(0);
        let height = rects
            .iter()
            .zip(&sheet.placements)
            .map(|(&(_, h), p)| p.y + h)
            .max()
            .unwrap_or(0);
        assert_eq!(sheet.width, width, "sheet width must be the tight bound");
        assert_eq!(sheet.height, height, "sheet height must be the tight bound");
    }

    #[test]
    fn test_zero_rectangles_produce_zero_sheet() {
        let sheet = pack(&[]);
        assert_eq!(sheet.width, 0);
        assert_eq!(sheet.height, 0);
        assert!(sheet.placements.is_empty());
    }

    #[test]
    fn test_single_rectangle_sits_at_origin() {
        let sheet = pack(&[(20, 30)]);
        assert_eq!(sheet.placements, vec![Placement { x: 0, y: 0 }]);
        assert_eq!(sheet.width, 20);
        assert_eq!(sheet.height, 30);
    }

    #[test]
    fn test_three_equal_squares() {
        let rects = [(16, 16), (16, 16), (16, 16)];
        let sheet = pack(&rects);
        assert_eq!(sheet.placements[0], Placement { x: 0, y: 0 });
        assert!(sheet.width >= 32, "three 16px squares need width >= 32 or height >= 32");
        assert_no_overlaps(&rects, &sheet);
        assert_tight_bounds(&rects, &sheet);
    }

    #[test]
    fn test_packing_is_deterministic() {
        let rects = [(16, 16), (8, 24), (40, 10), (12, 12), (3, 50), (16, 16)];
        let first = pack(&rects);
        let second = pack(&rects);
        assert_eq!(first.placements, second.placements);
        assert_eq!((first.width, first.height), (second.width, second.height));
    }

    #[test]
    fn test_mixed_sizes_never_overlap() {
        let rects = [
            (100, 20),
            (20, 100),
            (50, 50),
            (10, 10),
            (10, 10),
            (64, 64),
            (1, 1),
            (33, 7),
        ];
        let sheet = pack(&rects);
        assert_no_overlaps(&rects, &sheet);
        assert_tight_bounds(&rects, &sheet);
    }

    #[test]
    fn test_oversized_rectangle_triggers_growth() {
        // Second rectangle is both wider and taller than the seeded sheet.
        let rects = [(10, 10), (100, 100)];
        let sheet = pack(&rects);
        assert_no_overlaps(&rects, &sheet);
        assert_tight_bounds(&rects, &sheet);
        assert!(sheet.width >= 100);
        assert!(sheet.height >= 100);
    }

    #[test]
    fn test_growth_stays_roughly_square() {
        let rects = [(16, 16); 16];
        let sheet = pack(&rects);
        assert_no_overlaps(&rects, &sheet);
        assert_tight_bounds(&rects, &sheet);
        // 16 equal squares should settle into a 4x4 arrangement, not a strip.
        assert_eq!((sheet.width, sheet.height), (64, 64));
    }

    #[test]
    fn test_input_order_is_respected() {
        // The first rectangle always seeds the sheet at the origin, even
        // when later rectangles are larger.
        let rects = [(5, 5), (50, 5), (5, 50)];
        let sheet = pack(&rects);
        assert_eq!(sheet.placements[0], Placement { x: 0, y: 0 });
        assert_no_overlaps(&rects, &sheet);
    }
}
