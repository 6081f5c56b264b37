//! Coordinate arithmetic on sealed [`ArrayMetadata`].
//!
//! Every method is a pure function of its arguments and the immutable sealed
//! state: stride tables are precomputed when the metadata is sealed, and no
//! method allocates scratch shared between calls.

use std::cmp::Ordering;

use itertools::izip;
use num_traits::NumCast;

use crate::{
    coordinate::{buffer_binary, CoordinateBuffer, CoordinateType},
    hyperspace::Hyperspace,
    layout::Layout,
};

use super::{ArrayMetadata, ArrayMetadataCheckError, GeometryError, IncompatibleDimensionalityError};

/// The kind of overlap between two subarrays.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SubarrayOverlap {
    /// The subarrays are disjoint.
    Disjoint,
    /// The first subarray fully covers the second.
    Cover,
    /// A partial overlap that is not contiguous in the cell order of the
    /// first subarray.
    Partial,
    /// A partial overlap that is contiguous in the cell order of the first
    /// subarray.
    PartialContiguous,
}

impl SubarrayOverlap {
    /// The numeric overlap code: 0 disjoint, 1 cover, 2 partial,
    /// 3 contiguous partial.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Disjoint => 0,
            Self::Cover => 1,
            Self::Partial => 2,
            Self::PartialContiguous => 3,
        }
    }
}

/// The tile domain of an array together with a subarray clipped into it, in
/// tile indices. Returned by [`ArrayMetadata::get_subarray_tile_domain`].
#[derive(Clone, Debug, PartialEq)]
pub struct SubarrayTileDomain<T> {
    tile_domain: Vec<T>,
    subarray: Vec<T>,
}

impl<T: CoordinateType> SubarrayTileDomain<T> {
    /// The `[lo, hi]` tile index bounds of the array, per dimension
    /// (`2 * dim_num` values, lower bounds always zero).
    #[must_use]
    pub fn tile_domain(&self) -> &[T] {
        &self.tile_domain
    }

    /// The input subarray clipped into the tile domain, as `[lo, hi]` tile
    /// indices per dimension.
    #[must_use]
    pub fn subarray(&self) -> &[T] {
        &self.subarray
    }
}

/// Derived stride tables of an array with regular tiles.
pub(crate) struct RegularTables {
    pub tile_domain_spans: Vec<u64>,
    pub tile_num: Option<u64>,
    pub tile_offsets_row: Vec<u64>,
    pub tile_offsets_col: Vec<u64>,
    pub cell_num_per_tile: Option<u64>,
    pub cell_offsets_row: Vec<u64>,
    pub cell_offsets_col: Vec<u64>,
}

impl RegularTables {
    /// The empty tables of an array with irregular tiles.
    pub(crate) fn irregular() -> Self {
        Self {
            tile_domain_spans: Vec::new(),
            tile_num: None,
            tile_offsets_row: Vec::new(),
            tile_offsets_col: Vec::new(),
            cell_num_per_tile: None,
            cell_offsets_row: Vec::new(),
            cell_offsets_col: Vec::new(),
        }
    }
}

/// Compute the derived tables for an array with regular tiles.
pub(crate) fn compute_regular_tables_dispatch(
    hyperspace: &Hyperspace,
    domain: &CoordinateBuffer,
    extents: &CoordinateBuffer,
    dense: bool,
) -> Result<RegularTables, ArrayMetadataCheckError> {
    buffer_binary!(domain, extents, (domain, extents) => {
        compute_regular_tables(hyperspace, domain, extents, dense)
    }, _ => unreachable!("domain and tile extents share the hyperspace coordinate type"))
}

fn compute_regular_tables<T: CoordinateType>(
    hyperspace: &Hyperspace,
    domain: &[T],
    extents: &[T],
    dense: bool,
) -> Result<RegularTables, ArrayMetadataCheckError> {
    let mut tile_domain_spans = Vec::with_capacity(extents.len());
    for (d, (extent, bounds)) in std::iter::zip(extents, domain.chunks_exact(2)).enumerate() {
        if dense && !T::divides(*extent, bounds[0], bounds[1]) {
            let name = hyperspace
                .dimension(d)
                .map_or(String::new(), |dimension| dimension.name().to_string());
            return Err(ArrayMetadataCheckError::ExtentDoesNotDivideSpan(name));
        }
        tile_domain_spans.push(bounds[1].tile_index(bounds[0], *extent) + 1);
    }

    let mut tile_num = 1u64;
    for span in &tile_domain_spans {
        tile_num = tile_num
            .checked_mul(*span)
            .ok_or(ArrayMetadataCheckError::TileDomainOverflow)?;
    }

    let tile_offsets_row = row_major_offsets(&tile_domain_spans);
    let tile_offsets_col = col_major_offsets(&tile_domain_spans);

    let (cell_num_per_tile, cell_offsets_row, cell_offsets_col) = if dense {
        let extent_cells = extents
            .iter()
            .map(|extent| {
                extent
                    .to_u64()
                    .ok_or(ArrayMetadataCheckError::CellNumPerTileOverflow)
            })
            .collect::<Result<Vec<u64>, _>>()?;
        let mut cell_num = 1u64;
        for extent in &extent_cells {
            cell_num = cell_num
                .checked_mul(*extent)
                .ok_or(ArrayMetadataCheckError::CellNumPerTileOverflow)?;
        }
        (
            Some(cell_num),
            row_major_offsets(&extent_cells),
            col_major_offsets(&extent_cells),
        )
    } else {
        (None, Vec::new(), Vec::new())
    };

    Ok(RegularTables {
        tile_domain_spans,
        tile_num: Some(tile_num),
        tile_offsets_row,
        tile_offsets_col,
        cell_num_per_tile,
        cell_offsets_row,
        cell_offsets_col,
    })
}

/// Row-major strides over `spans`: the last dimension varies fastest.
fn row_major_offsets(spans: &[u64]) -> Vec<u64> {
    let mut offsets = vec![1u64; spans.len()];
    for i in (0..spans.len().saturating_sub(1)).rev() {
        offsets[i] = offsets[i + 1] * spans[i + 1];
    }
    offsets
}

/// Column-major strides over `spans`: the first dimension varies fastest.
fn col_major_offsets(spans: &[u64]) -> Vec<u64> {
    let mut offsets = vec![1u64; spans.len()];
    for i in 1..spans.len() {
        offsets[i] = offsets[i - 1] * spans[i - 1];
    }
    offsets
}

impl ArrayMetadata {
    fn check_coordinate_type<T: CoordinateType>(&self) -> Result<(), GeometryError> {
        if T::DATATYPE == self.datatype {
            Ok(())
        } else {
            Err(GeometryError::IncompatibleCoordinateType {
                got: T::DATATYPE,
                expected: self.datatype,
            })
        }
    }

    fn check_dimensionality(&self, got: usize, expected: usize) -> Result<(), GeometryError> {
        if got == expected {
            Ok(())
        } else {
            Err(IncompatibleDimensionalityError::new(got, expected).into())
        }
    }

    fn typed_domain<T: CoordinateType>(&self) -> Result<&[T], GeometryError> {
        T::from_buffer(&self.domain).ok_or(GeometryError::IncompatibleCoordinateType {
            got: T::DATATYPE,
            expected: self.datatype,
        })
    }

    fn typed_tile_extents<T: CoordinateType>(&self) -> Result<&[T], GeometryError> {
        let extents = self
            .tile_extents
            .as_ref()
            .ok_or(GeometryError::NoRegularTiles)?;
        T::from_buffer(extents).ok_or(GeometryError::IncompatibleCoordinateType {
            got: T::DATATYPE,
            expected: self.datatype,
        })
    }

    fn tile_offsets(&self) -> &[u64] {
        match self.tile_order {
            Layout::ColMajor => &self.tile_offsets_col,
            _ => &self.tile_offsets_row,
        }
    }

    /// Compare two coordinates by their in-tile position under the array
    /// cell order. Assumes the coordinates lie in the same tile when the
    /// array has a regular tile grid.
    ///
    /// # Errors
    /// Returns [`GeometryError`] on a coordinate type or dimensionality
    /// mismatch.
    pub fn cell_order_cmp<T: CoordinateType>(
        &self,
        coords_a: &[T],
        coords_b: &[T],
    ) -> Result<Ordering, GeometryError> {
        self.check_coordinate_type::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(coords_a.len(), dim_num)?;
        self.check_dimensionality(coords_b.len(), dim_num)?;
        Ok(match self.cell_order {
            Layout::ColMajor => coords_cmp(coords_a.iter().rev(), coords_b.iter().rev()),
            _ => coords_cmp(coords_a.iter(), coords_b.iter()),
        })
    }

    /// Compare two coordinates by the tiles they fall into, under the array
    /// tile order. Returns [`Ordering::Equal`] for arrays with irregular
    /// tiles, whose cells all belong to the same (capacity-bound) tile space.
    ///
    /// # Errors
    /// Returns [`GeometryError`] on a coordinate type or dimensionality
    /// mismatch.
    pub fn tile_order_cmp<T: CoordinateType>(
        &self,
        coords_a: &[T],
        coords_b: &[T],
    ) -> Result<Ordering, GeometryError> {
        self.check_coordinate_type::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(coords_a.len(), dim_num)?;
        self.check_dimensionality(coords_b.len(), dim_num)?;
        let Some(extents) = &self.tile_extents else {
            return Ok(Ordering::Equal);
        };
        let extents = T::from_buffer(extents).ok_or(GeometryError::IncompatibleCoordinateType {
            got: T::DATATYPE,
            expected: self.datatype,
        })?;
        let domain = self.typed_domain::<T>()?;
        let cmp_at = |d: usize| {
            let lo = domain[2 * d];
            let extent = extents[d];
            coords_a[d]
                .tile_index(lo, extent)
                .cmp(&coords_b[d].tile_index(lo, extent))
        };
        match self.tile_order {
            Layout::ColMajor => {
                for d in (0..dim_num).rev() {
                    match cmp_at(d) {
                        Ordering::Equal => {}
                        order => return Ok(order),
                    }
                }
            }
            _ => {
                for d in 0..dim_num {
                    match cmp_at(d) {
                        Ordering::Equal => {}
                        order => return Ok(order),
                    }
                }
            }
        }
        Ok(Ordering::Equal)
    }

    /// Compare two coordinates by tile order first, breaking ties by cell
    /// order. This is the global order of the array.
    ///
    /// # Errors
    /// Returns [`GeometryError`] on a coordinate type or dimensionality
    /// mismatch.
    pub fn tile_cell_order_cmp<T: CoordinateType>(
        &self,
        coords_a: &[T],
        coords_b: &[T],
    ) -> Result<Ordering, GeometryError> {
        match self.tile_order_cmp(coords_a, coords_b)? {
            Ordering::Equal => self.cell_order_cmp(coords_a, coords_b),
            order => Ok(order),
        }
    }

    /// The id of the tile that `cell_coords` falls into, along the array
    /// tile order.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn tile_id<T: CoordinateType>(&self, cell_coords: &[T]) -> Result<u64, GeometryError> {
        let extents = self.typed_tile_extents::<T>()?;
        let domain = self.typed_domain::<T>()?;
        self.check_dimensionality(cell_coords.len(), self.dim_num())?;
        Ok(izip!(
            cell_coords,
            extents,
            self.tile_offsets(),
            domain.chunks_exact(2)
        )
        .map(|(coord, extent, offset, bounds)| coord.tile_index(bounds[0], *extent) * offset)
        .sum())
    }

    /// The position of `coords` inside its tile, along the array cell order.
    ///
    /// The position is in `[0, cell_num_per_tile)`, and the mapping from the
    /// tile's cells to positions is a bijection.
    ///
    /// # Errors
    /// Returns [`GeometryError::NotDense`] for sparse arrays, or
    /// [`GeometryError`] on a coordinate type or dimensionality mismatch.
    pub fn get_cell_pos<T: CoordinateType>(&self, coords: &[T]) -> Result<u64, GeometryError> {
        if !self.dense() {
            return Err(GeometryError::NotDense);
        }
        let extents = self.typed_tile_extents::<T>()?;
        let domain = self.typed_domain::<T>()?;
        self.check_dimensionality(coords.len(), self.dim_num())?;
        let offsets = match self.cell_order {
            Layout::ColMajor => &self.cell_offsets_col,
            _ => &self.cell_offsets_row,
        };
        Ok(izip!(coords, extents, offsets, domain.chunks_exact(2))
            .map(|(coord, extent, offset, bounds)| {
                coord.in_tile_offset(bounds[0], *extent) * offset
            })
            .sum())
    }

    /// Advance `cell_coords` to its lexicographic successor within `domain`
    /// (`2 * dim_num` values) along the array cell order, disregarding the
    /// tile grid.
    ///
    /// Returns true while the advanced coordinates remain inside `domain`,
    /// and false once the walk has exited it.
    ///
    /// # Errors
    /// Returns [`GeometryError`] on a coordinate type or dimensionality
    /// mismatch.
    pub fn get_next_cell_coords<T: CoordinateType>(
        &self,
        domain: &[T],
        cell_coords: &mut [T],
    ) -> Result<bool, GeometryError> {
        self.check_coordinate_type::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(domain.len(), 2 * dim_num)?;
        self.check_dimensionality(cell_coords.len(), dim_num)?;
        Ok(match self.cell_order {
            Layout::ColMajor => next_coords_col(domain, cell_coords),
            _ => next_coords_row(domain, cell_coords),
        })
    }

    /// Retreat `cell_coords` to its lexicographic predecessor within `domain`
    /// (`2 * dim_num` values) along the array cell order, disregarding the
    /// tile grid.
    ///
    /// Returns true while the retreated coordinates remain inside `domain`,
    /// and false once the walk has exited it.
    ///
    /// # Errors
    /// Returns [`GeometryError`] on a coordinate type or dimensionality
    /// mismatch.
    pub fn get_previous_cell_coords<T: CoordinateType>(
        &self,
        domain: &[T],
        cell_coords: &mut [T],
    ) -> Result<bool, GeometryError> {
        self.check_coordinate_type::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(domain.len(), 2 * dim_num)?;
        self.check_dimensionality(cell_coords.len(), dim_num)?;
        Ok(match self.cell_order {
            Layout::ColMajor => previous_coords_col(domain, cell_coords),
            _ => previous_coords_row(domain, cell_coords),
        })
    }

    /// Advance `tile_coords` to the next tile within the tile domain
    /// `tile_domain` (`2 * dim_num` values), along the array tile order.
    ///
    /// Returns true while the advanced tile coordinates remain inside
    /// `tile_domain`, and false once the walk has exited it.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn get_next_tile_coords<T: CoordinateType>(
        &self,
        tile_domain: &[T],
        tile_coords: &mut [T],
    ) -> Result<bool, GeometryError> {
        self.typed_tile_extents::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(tile_domain.len(), 2 * dim_num)?;
        self.check_dimensionality(tile_coords.len(), dim_num)?;
        Ok(match self.tile_order {
            Layout::ColMajor => next_coords_col(tile_domain, tile_coords),
            _ => next_coords_row(tile_domain, tile_coords),
        })
    }

    /// The tile domain of the array and `subarray` clipped into it, as tile
    /// indices.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn get_subarray_tile_domain<T: CoordinateType>(
        &self,
        subarray: &[T],
    ) -> Result<SubarrayTileDomain<T>, GeometryError> {
        let extents = self.typed_tile_extents::<T>()?;
        let domain = self.typed_domain::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(subarray.len(), 2 * dim_num)?;
        let mut tile_domain = Vec::with_capacity(2 * dim_num);
        let mut subarray_in_tile_domain = Vec::with_capacity(2 * dim_num);
        for (bounds, extent, sub) in izip!(
            domain.chunks_exact(2),
            extents,
            subarray.chunks_exact(2)
        ) {
            let last = bounds[1].tile_index(bounds[0], *extent);
            let lo = sub[0].tile_index(bounds[0], *extent).min(last);
            let hi = sub[1].tile_index(bounds[0], *extent).min(last);
            tile_domain.push(T::zero());
            tile_domain.push(cast_index::<T>(last));
            subarray_in_tile_domain.push(cast_index::<T>(lo));
            subarray_in_tile_domain.push(cast_index::<T>(hi));
        }
        Ok(SubarrayTileDomain {
            tile_domain,
            subarray: subarray_in_tile_domain,
        })
    }

    /// The position of `tile_coords` along the array tile order within the
    /// array tile domain.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn get_tile_pos<T: CoordinateType>(&self, tile_coords: &[T]) -> Result<u64, GeometryError> {
        self.typed_tile_extents::<T>()?;
        self.check_dimensionality(tile_coords.len(), self.dim_num())?;
        Ok(std::iter::zip(tile_coords, self.tile_offsets())
            .map(|(tile_coord, offset)| tile_coord.to_u64().unwrap_or(0) * offset)
            .sum())
    }

    /// The position of `tile_coords` along the array tile order within the
    /// tile domain `domain` (`2 * dim_num` values), which may be a
    /// sub-domain of the array tile domain.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn get_tile_pos_in_domain<T: CoordinateType>(
        &self,
        domain: &[T],
        tile_coords: &[T],
    ) -> Result<u64, GeometryError> {
        self.typed_tile_extents::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(domain.len(), 2 * dim_num)?;
        self.check_dimensionality(tile_coords.len(), dim_num)?;
        let mut pos = 0u64;
        let mut offset = 1u64;
        match self.tile_order {
            Layout::ColMajor => {
                for d in 0..dim_num {
                    pos += tile_coords[d].offset_from(domain[2 * d]) * offset;
                    offset = offset
                        .saturating_mul(T::span(domain[2 * d], domain[2 * d + 1]).unwrap_or(u64::MAX));
                }
            }
            _ => {
                for d in (0..dim_num).rev() {
                    pos += tile_coords[d].offset_from(domain[2 * d]) * offset;
                    offset = offset
                        .saturating_mul(T::span(domain[2 * d], domain[2 * d + 1]).unwrap_or(u64::MAX));
                }
            }
        }
        Ok(pos)
    }

    /// The `[lo, hi]` cell range covered by the tile at `tile_coords`, per
    /// dimension (`2 * dim_num` values, in global coordinates).
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn get_tile_subarray<T: CoordinateType>(
        &self,
        tile_coords: &[T],
    ) -> Result<Vec<T>, GeometryError> {
        let extents = self.typed_tile_extents::<T>()?;
        let domain = self.typed_domain::<T>()?;
        self.check_dimensionality(tile_coords.len(), self.dim_num())?;
        let mut tile_subarray = Vec::with_capacity(2 * self.dim_num());
        for (bounds, extent, tile_coord) in izip!(domain.chunks_exact(2), extents, tile_coords) {
            let lo = bounds[0] + *tile_coord * *extent;
            tile_subarray.push(lo);
            tile_subarray.push(lo + *extent - T::one());
        }
        Ok(tile_subarray)
    }

    /// Expand `domain` (`2 * dim_num` values) outward so that it coincides
    /// with tile boundaries. Does nothing for arrays without a regular tile
    /// grid.
    ///
    /// # Errors
    /// Returns [`GeometryError`] on a coordinate type or dimensionality
    /// mismatch.
    pub fn expand_domain<T: CoordinateType>(&self, domain: &mut [T]) -> Result<(), GeometryError> {
        self.check_coordinate_type::<T>()?;
        self.check_dimensionality(domain.len(), 2 * self.dim_num())?;
        let Some(extents) = &self.tile_extents else {
            return Ok(());
        };
        let extents = T::from_buffer(extents).ok_or(GeometryError::IncompatibleCoordinateType {
            got: T::DATATYPE,
            expected: self.datatype,
        })?;
        let array_domain = self.typed_domain::<T>()?;
        for (d, extent) in extents.iter().enumerate() {
            let lo = array_domain[2 * d];
            domain[2 * d] = domain[2 * d].tile_snap_down(lo, *extent);
            domain[2 * d + 1] = domain[2 * d + 1].tile_snap_up(lo, *extent);
        }
        Ok(())
    }

    /// Intersect `subarray_a` and `subarray_b` into `overlap` (each
    /// `2 * dim_num` values) and classify the overlap.
    ///
    /// # Errors
    /// Returns [`GeometryError`] on a coordinate type or dimensionality
    /// mismatch.
    pub fn subarray_overlap<T: CoordinateType>(
        &self,
        subarray_a: &[T],
        subarray_b: &[T],
        overlap: &mut [T],
    ) -> Result<SubarrayOverlap, GeometryError> {
        self.check_coordinate_type::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(subarray_a.len(), 2 * dim_num)?;
        self.check_dimensionality(subarray_b.len(), 2 * dim_num)?;
        self.check_dimensionality(overlap.len(), 2 * dim_num)?;

        for d in 0..dim_num {
            overlap[2 * d] = if subarray_a[2 * d] > subarray_b[2 * d] {
                subarray_a[2 * d]
            } else {
                subarray_b[2 * d]
            };
            overlap[2 * d + 1] = if subarray_a[2 * d + 1] < subarray_b[2 * d + 1] {
                subarray_a[2 * d + 1]
            } else {
                subarray_b[2 * d + 1]
            };
        }

        if (0..dim_num).any(|d| overlap[2 * d] > overlap[2 * d + 1]) {
            return Ok(SubarrayOverlap::Disjoint);
        }
        if overlap[..] == subarray_b[..] {
            return Ok(SubarrayOverlap::Cover);
        }

        // A partial overlap is contiguous in the cell order of subarray_a
        // when it matches subarray_a on every dimension but the slowest
        // varying one.
        let matches_a = |d: usize| {
            overlap[2 * d] == subarray_a[2 * d] && overlap[2 * d + 1] == subarray_a[2 * d + 1]
        };
        let contiguous = match self.cell_order {
            Layout::ColMajor => (0..dim_num.saturating_sub(1)).all(matches_a),
            _ => (1..dim_num).all(matches_a),
        };
        Ok(if contiguous {
            SubarrayOverlap::PartialContiguous
        } else {
            SubarrayOverlap::Partial
        })
    }

    /// Returns true if `range` (`2 * dim_num` values) is contained in a
    /// single row of tiles, i.e. it spans at most one tile on every
    /// dimension except the last.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn is_contained_in_tile_slab_row<T: CoordinateType>(
        &self,
        range: &[T],
    ) -> Result<bool, GeometryError> {
        let dim_num = self.dim_num();
        self.contained_in_tile_slab(range, 0..dim_num - 1)
    }

    /// Returns true if `range` (`2 * dim_num` values) is contained in a
    /// single column of tiles, i.e. it spans at most one tile on every
    /// dimension except the first.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn is_contained_in_tile_slab_col<T: CoordinateType>(
        &self,
        range: &[T],
    ) -> Result<bool, GeometryError> {
        let dim_num = self.dim_num();
        self.contained_in_tile_slab(range, 1..dim_num)
    }

    fn contained_in_tile_slab<T: CoordinateType>(
        &self,
        range: &[T],
        dims: std::ops::Range<usize>,
    ) -> Result<bool, GeometryError> {
        let extents = self.typed_tile_extents::<T>()?;
        let domain = self.typed_domain::<T>()?;
        self.check_dimensionality(range.len(), 2 * self.dim_num())?;
        for d in dims {
            let lo = domain[2 * d];
            let extent = extents[d];
            if range[2 * d].tile_index(lo, extent) != range[2 * d + 1].tile_index(lo, extent) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The number of cells in one row tile slab of `subarray`
    /// (`2 * dim_num` values): the subarray clipped to a single tile along
    /// the first dimension.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn tile_slab_row_cell_num<T: CoordinateType>(
        &self,
        subarray: &[T],
    ) -> Result<u64, GeometryError> {
        let extents = self.typed_tile_extents::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(subarray.len(), 2 * dim_num)?;
        let span =
            |d: usize| T::span(subarray[2 * d], subarray[2 * d + 1]).unwrap_or(u64::MAX);
        let mut cell_num = span(0).min(extents[0].to_u64().unwrap_or(u64::MAX));
        for d in 1..dim_num {
            cell_num = cell_num.saturating_mul(span(d));
        }
        Ok(cell_num)
    }

    /// The number of cells in one column tile slab of `subarray`
    /// (`2 * dim_num` values): the subarray clipped to a single tile along
    /// the last dimension.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn tile_slab_col_cell_num<T: CoordinateType>(
        &self,
        subarray: &[T],
    ) -> Result<u64, GeometryError> {
        let extents = self.typed_tile_extents::<T>()?;
        let dim_num = self.dim_num();
        self.check_dimensionality(subarray.len(), 2 * dim_num)?;
        let span =
            |d: usize| T::span(subarray[2 * d], subarray[2 * d + 1]).unwrap_or(u64::MAX);
        let mut cell_num =
            span(dim_num - 1).min(extents[dim_num - 1].to_u64().unwrap_or(u64::MAX));
        for d in 0..dim_num - 1 {
            cell_num = cell_num.saturating_mul(span(d));
        }
        Ok(cell_num)
    }

    /// The number of tiles in the array domain.
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles.
    pub fn tile_num(&self) -> Result<u64, GeometryError> {
        self.tile_num.ok_or(GeometryError::NoRegularTiles)
    }

    /// The number of tiles overlapping `range` (`2 * dim_num` values).
    ///
    /// # Errors
    /// Returns [`GeometryError::NoRegularTiles`] for arrays with irregular
    /// tiles, or on a coordinate type or dimensionality mismatch.
    pub fn tile_num_in_range<T: CoordinateType>(&self, range: &[T]) -> Result<u64, GeometryError> {
        let extents = self.typed_tile_extents::<T>()?;
        let domain = self.typed_domain::<T>()?;
        self.check_dimensionality(range.len(), 2 * self.dim_num())?;
        let mut tile_num = 1u64;
        for (bounds, extent, sub) in izip!(
            domain.chunks_exact(2),
            extents,
            range.chunks_exact(2)
        ) {
            let lo = sub[0].tile_index(bounds[0], *extent);
            let hi = sub[1].tile_index(bounds[0], *extent);
            tile_num = tile_num.saturating_mul(hi.saturating_sub(lo) + 1);
        }
        Ok(tile_num)
    }
}

fn coords_cmp<'a, T: CoordinateType>(
    coords_a: impl Iterator<Item = &'a T>,
    coords_b: impl Iterator<Item = &'a T>,
) -> Ordering {
    for (a, b) in std::iter::zip(coords_a, coords_b) {
        match a.partial_cmp(b) {
            Some(Ordering::Less) => return Ordering::Less,
            Some(Ordering::Greater) => return Ordering::Greater,
            _ => {}
        }
    }
    Ordering::Equal
}

fn cast_index<T: CoordinateType>(index: u64) -> T {
    NumCast::from(index).unwrap_or_else(T::max_value)
}

/// Increment `coords[i]`, reporting whether it left `[domain_lo, domain_hi]`.
fn step_up<T: CoordinateType>(coords: &mut [T], domain: &[T], i: usize) -> bool {
    match coords[i].step_forward() {
        Some(next) => {
            coords[i] = next;
            next > domain[2 * i + 1]
        }
        None => true,
    }
}

/// Decrement `coords[i]`, reporting whether it left `[domain_lo, domain_hi]`.
fn step_down<T: CoordinateType>(coords: &mut [T], domain: &[T], i: usize) -> bool {
    match coords[i].step_backward() {
        Some(previous) => {
            coords[i] = previous;
            previous < domain[2 * i]
        }
        None => true,
    }
}

fn next_coords_row<T: CoordinateType>(domain: &[T], coords: &mut [T]) -> bool {
    let dim_num = coords.len();
    let mut i = dim_num - 1;
    let mut exceeded = step_up(coords, domain, i);
    while i > 0 && exceeded {
        coords[i] = domain[2 * i];
        i -= 1;
        exceeded = step_up(coords, domain, i);
    }
    !(i == 0 && exceeded)
}

fn next_coords_col<T: CoordinateType>(domain: &[T], coords: &mut [T]) -> bool {
    let dim_num = coords.len();
    let mut i = 0;
    let mut exceeded = step_up(coords, domain, i);
    while i + 1 < dim_num && exceeded {
        coords[i] = domain[2 * i];
        i += 1;
        exceeded = step_up(coords, domain, i);
    }
    !(i + 1 == dim_num && exceeded)
}

fn previous_coords_row<T: CoordinateType>(domain: &[T], coords: &mut [T]) -> bool {
    let dim_num = coords.len();
    let mut i = dim_num - 1;
    let mut exceeded = step_down(coords, domain, i);
    while i > 0 && exceeded {
        coords[i] = domain[2 * i + 1];
        i -= 1;
        exceeded = step_down(coords, domain, i);
    }
    !(i == 0 && exceeded)
}

fn previous_coords_col<T: CoordinateType>(domain: &[T], coords: &mut [T]) -> bool {
    let dim_num = coords.len();
    let mut i = 0;
    let mut exceeded = step_down(coords, domain, i);
    while i + 1 < dim_num && exceeded {
        coords[i] = domain[2 * i + 1];
        i += 1;
        exceeded = step_down(coords, domain, i);
    }
    !(i + 1 == dim_num && exceeded)
}
