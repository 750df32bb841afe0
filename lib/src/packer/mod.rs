//! Build-plate footprint packing.
//!
//! This module arranges object footprints on the bed without overlap using a
//! growing binary-tree guillotine packer.
//!
//! ## Algorithm Overview
//!
//! 1. Sort objects by their largest footprint dimension, biggest first
//! 2. Start the bin as exactly the first object's footprint, so it never has
//!    to grow in both directions at once
//! 3. For each object, search the tree (right before up) for an empty leaf
//!    it fits into, then split the leftover space into two children
//! 4. If nothing fits, grow the bin right or up, preferring whichever keeps
//!    the bin closest to square
//!
//! The bin size after packing is the aggregate footprint of all objects.

pub mod rearrange;

pub use rearrange::{rearrange, rearrange_with_config};

use crate::geometry::BoundingBox3;
use crate::{CoordF, Error, Result, MAXIMUM_OBJECTS};
use std::fmt;

/// An object that can be placed on the bed.
///
/// Width and length are the X and Y extent of the bounding box.
pub trait Placeable {
    fn bounding_box(&self) -> BoundingBox3;

    fn width(&self) -> CoordF {
        self.bounding_box().width()
    }

    fn length(&self) -> CoordF {
        self.bounding_box().length()
    }

    fn translate(&mut self, dx: CoordF, dy: CoordF, dz: CoordF);
}

/// A named rectangular footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub name: String,
    pub bbox: BoundingBox3,
}

impl Footprint {
    /// A footprint of the given size with its minimum corner at the origin.
    pub fn new(name: impl Into<String>, width: CoordF, length: CoordF) -> Self {
        Self {
            name: name.into(),
            bbox: BoundingBox3::from_corners([0.0, 0.0, 0.0], [width, length, 0.0]),
        }
    }

    pub fn with_bounding_box(name: impl Into<String>, bbox: BoundingBox3) -> Self {
        Self {
            name: name.into(),
            bbox,
        }
    }

    /// Minimum XY corner.
    pub fn origin(&self) -> (CoordF, CoordF) {
        (self.bbox.min[0], self.bbox.min[1])
    }
}

impl Placeable for Footprint {
    fn bounding_box(&self) -> BoundingBox3 {
        self.bbox
    }

    fn translate(&mut self, dx: CoordF, dy: CoordF, dz: CoordF) {
        self.bbox.translate(dx, dy, dz);
    }
}

/// A rectangle in bed space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: CoordF,
    pub y: CoordF,
    pub width: CoordF,
    pub length: CoordF,
}

impl Rect {
    #[inline]
    fn new(x: CoordF, y: CoordF, width: CoordF, length: CoordF) -> Self {
        Self {
            x,
            y,
            width,
            length,
        }
    }

    #[inline]
    fn fits(&self, width: CoordF, length: CoordF) -> bool {
        width <= self.width && length <= self.length
    }
}

/// Where an object landed in the bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Index into the slice handed to [`Packer::new`].
    pub index: usize,
    pub x: CoordF,
    pub y: CoordF,
}

#[derive(Debug)]
enum Content {
    /// Free space.
    Empty,
    /// Holds an object; the leftover space is split into the children.
    Placed {
        object: usize,
        up: Box<Node>,
        right: Box<Node>,
    },
    /// Created when the bin grows; never holds an object itself.
    Internal { up: Box<Node>, right: Box<Node> },
}

#[derive(Debug)]
struct Node {
    rect: Rect,
    content: Content,
}

impl Node {
    fn leaf(x: CoordF, y: CoordF, width: CoordF, length: CoordF) -> Self {
        Self {
            rect: Rect::new(x, y, width, length),
            content: Content::Empty,
        }
    }

    /// Depth-first search for an empty leaf that fits, right subtree first.
    fn insert_search(&mut self, width: CoordF, length: CoordF) -> Option<&mut Node> {
        if matches!(self.content, Content::Empty) {
            return if self.rect.fits(width, length) {
                Some(self)
            } else {
                None
            };
        }
        match &mut self.content {
            Content::Placed { up, right, .. } | Content::Internal { up, right } => {
                if let Some(node) = right.insert_search(width, length) {
                    return Some(node);
                }
                up.insert_search(width, length)
            }
            Content::Empty => None,
        }
    }

    /// Place an object and split the leftover space.
    fn place(&mut self, object: usize, width: CoordF, length: CoordF) {
        let r = self.rect;
        self.content = Content::Placed {
            object,
            up: Box::new(Node::leaf(r.x, r.y + length, r.width, r.length - length)),
            right: Box::new(Node::leaf(r.x + width, r.y, r.width - width, length)),
        };
    }

    fn visit(&self, f: &mut impl FnMut(usize, &Rect)) {
        match &self.content {
            Content::Empty => {}
            Content::Placed { object, up, right } => {
                f(*object, &self.rect);
                up.visit(f);
                right.visit(f);
            }
            Content::Internal { up, right } => {
                up.visit(f);
                right.visit(f);
            }
        }
    }
}

/// Packs objects into a rectangular bin.
pub struct Packer<'a, T: Placeable> {
    objects: &'a mut [T],
    root: Option<Node>,
    packed: bool,
}

impl<'a, T: Placeable> Packer<'a, T> {
    /// Create a packer over the given objects.
    ///
    /// Fails with a validation error when there are more than
    /// [`MAXIMUM_OBJECTS`] objects or any bounding box is void or open.
    pub fn new(objects: &'a mut [T]) -> Result<Self> {
        Self::with_limit(objects, MAXIMUM_OBJECTS)
    }

    /// Like [`Packer::new`] with a custom object limit.
    pub fn with_limit(objects: &'a mut [T], max_objects: usize) -> Result<Self> {
        if objects.len() > max_objects {
            log::error!(
                "BinPack: object count {} exceeds maximum {}",
                objects.len(),
                max_objects
            );
            return Err(Error::Validation(format!(
                "too many objects: {} (maximum {})",
                objects.len(),
                max_objects
            )));
        }
        for (i, o) in objects.iter().enumerate() {
            let bb = o.bounding_box();
            if bb.is_open() {
                return Err(Error::Validation(format!(
                    "object {} has infinite volume",
                    i
                )));
            }
            if bb.is_void() {
                return Err(Error::Validation(format!("object {} is empty", i)));
            }
        }
        Ok(Self {
            objects,
            root: None,
            packed: false,
        })
    }

    /// Pack all objects and return the bin size `(width, length)`.
    ///
    /// The tree is rebuilt on every call.
    pub fn pack(&mut self) -> Result<(CoordF, CoordF)> {
        self.root = None;
        self.packed = false;

        if self.objects.is_empty() {
            log::debug!("BinPack: nothing to pack");
            self.packed = true;
            return Ok((0.0, 0.0));
        }

        // Sort biggest to smallest by the largest footprint dimension.
        // `sort_by` is stable, so equal objects keep their input order.
        let dims: Vec<(CoordF, CoordF)> = self
            .objects
            .iter()
            .map(|o| (o.width(), o.length()))
            .collect();
        let mut order: Vec<usize> = (0..dims.len()).collect();
        order.sort_by(|&a, &b| {
            let ka = dims[a].0.max(dims[a].1);
            let kb = dims[b].0.max(dims[b].1);
            kb.total_cmp(&ka)
        });

        let (first_w, first_l) = dims[order[0]];
        log::trace!(
            "BinPack: creating root node: {:.3}x{:.3} @ (0.000,0.000)",
            first_w,
            first_l
        );
        let mut root = Node::leaf(0.0, 0.0, first_w, first_l);

        for &index in &order {
            let (w, l) = dims[index];
            if let Some(node) = root.insert_search(w, l) {
                log::trace!(
                    "BinPack: adding object to bin: {:.3}x{:.3} @ ({:.3},{:.3})",
                    w,
                    l,
                    node.rect.x,
                    node.rect.y
                );
                node.place(index, w, l);
                continue;
            }

            log::trace!("BinPack: insufficient space; growing bin");
            root = Self::grow(root, index, w, l)?;
        }

        let size = (root.rect.width, root.rect.length);
        log::debug!("BinPack: final bin size: {:.3}x{:.3}", size.0, size.1);
        self.root = Some(root);
        self.packed = true;
        Ok(size)
    }

    /// Grow the bin to fit an object and place it in the new space.
    fn grow(root: Node, index: usize, width: CoordF, length: CoordF) -> Result<Node> {
        let bin = root.rect;
        let can_grow_up = width <= bin.width;
        let can_grow_right = length <= bin.length;
        let should_grow_up = can_grow_up && bin.width >= bin.length + length;
        let should_grow_right = can_grow_right && bin.length >= bin.width + width;

        if should_grow_right || (!should_grow_up && can_grow_right) {
            let mut leaf = Node::leaf(bin.width, 0.0, width, bin.length);
            leaf.place(index, width, length);
            Ok(Node {
                rect: Rect::new(0.0, 0.0, bin.width + width, bin.length),
                content: Content::Internal {
                    up: Box::new(root),
                    right: Box::new(leaf),
                },
            })
        } else if can_grow_up {
            let mut leaf = Node::leaf(0.0, bin.length, bin.width, length);
            leaf.place(index, width, length);
            Ok(Node {
                rect: Rect::new(0.0, 0.0, bin.width, bin.length + length),
                content: Content::Internal {
                    up: Box::new(leaf),
                    right: Box::new(root),
                },
            })
        } else {
            log::error!("BinPack Error: Can't determine correct growth direction of bin");
            Err(Error::GrowthDirectionUndetermined)
        }
    }

    /// Where each object was placed, in depth-first tree order.
    pub fn placements(&self) -> Vec<Placement> {
        let mut result = Vec::with_capacity(self.objects.len());
        if let Some(root) = &self.root {
            root.visit(&mut |index, rect| {
                result.push(Placement {
                    index,
                    x: rect.x,
                    y: rect.y,
                })
            });
        }
        result
    }

    /// Move every placed object so its footprint minimum corner lands at its
    /// node position plus the offset. Z is left unchanged.
    pub fn arrange(&mut self, offset_x: CoordF, offset_y: CoordF) -> Result<()> {
        if !self.packed {
            return Err(Error::ArrangeBeforePack);
        }
        log::debug!(
            "BinPack: translating objects to new location, offset ({:.3},{:.3})",
            offset_x,
            offset_y
        );
        for placement in self.placements() {
            let object = &mut self.objects[placement.index];
            let bb = object.bounding_box();
            let dx = placement.x + offset_x - bb.min[0];
            let dy = placement.y + offset_y - bb.min[1];
            log::trace!(
                "BinPack: moving object {} to ({:.3},{:.3})",
                placement.index,
                placement.x + offset_x,
                placement.y + offset_y
            );
            object.translate(dx, dy, 0.0);
        }
        Ok(())
    }

    pub fn objects(&self) -> &[T] {
        self.objects
    }
}

impl<T: Placeable> fmt::Debug for Packer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packer")
            .field("objects", &self.objects.len())
            .field("packed", &self.packed)
            .field("bin", &self.root.as_ref().map(|r| r.rect))
            .finish()
    }
}
