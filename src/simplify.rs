//! Simplifier driver: wires [`crate::importance`] scores and
//! UV-seam detection into a vertex lock mask, clamps the requested index
//! count to what the capability contract accepts, and re-compacts the
//! result so the output densely reindexes its vertices.

use crate::capability::{CapabilityError, Remap, SimplifyParams, Simplifier};

/// One simplification request against a single primitive's geometry.
pub struct SimplifyRequest<'a> {
    /// Triangle-list indices.
    pub indices: &'a [u32],
    /// Vertex positions, one per vertex referenced by `indices`.
    pub positions: &'a [[f32; 3]],
    /// Optional UV coordinates, parallel to `positions`.
    pub uvs: Option<&'a [[f32; 2]]>,
    /// Merged per-vertex importance score, parallel to `positions`.
    pub importance: &'a [f32],
    /// Ratio of the original triangle count to target, in `(0, 1]`.
    pub ratio: f32,
    /// Score above which a vertex is locked against collapse.
    pub importance_threshold: f32,
    /// Maximum allowed geometric error, in normalized mesh-space units.
    pub error_threshold: f32,
}

/// Output of a simplification pass: a re-compacted index/vertex remap plus
/// the error meshoptimizer reports for the result.
pub struct SimplifyOutcome {
    /// Simplified indices, reindexed into the compacted vertex buffer.
    pub indices: Vec<u32>,
    /// Remap from the original vertex indices to the compacted buffer.
    pub remap: Remap,
    /// Error introduced by simplification.
    pub achieved_error: f32,
}

/// Runs one simplification pass at `request.ratio`, locking vertices whose
/// importance exceeds the threshold (seam vertices use half the
/// threshold), then re-compacts so unused vertices are dropped.
///
/// `ratio >= 1.0` is a no-op: the indices are returned compacted but
/// otherwise unsimplified, matching the LOD generator's "skip simplification
/// at ratio 1.0" rule.
pub fn simplify_primitive(
    simplifier: &dyn Simplifier,
    request: &SimplifyRequest,
) -> Result<SimplifyOutcome, CapabilityError> {
    let original_triangle_count = request.indices.len() / 3;
    let target_triangles = ((original_triangle_count as f32) * request.ratio).round() as usize;
    let target_index_count = (target_triangles.max(1) * 3).max(3);

    let (simplified_indices, achieved_error) = if request.ratio >= 1.0 {
        (request.indices.to_vec(), 0.0)
    } else {
        let seams = crate::importance::seam_vertices(request.positions, request.uvs);
        let lock_mask = crate::importance::vertex_lock_mask(request.importance, &seams, request.importance_threshold);

        let params = SimplifyParams {
            indices: request.indices,
            positions: request.positions,
            uvs: request.uvs,
            uv_weight: 1.0,
            vertex_lock: Some(&lock_mask),
            target_index_count,
            error_threshold: request.error_threshold,
            lock_border: true,
        };
        let result = simplifier.simplify(&params)?;
        (result.indices, result.achieved_error)
    };

    let remap = simplifier.compact(&simplified_indices, request.positions)?;
    let reindexed = apply_remap(&simplified_indices, &remap.remap);

    Ok(SimplifyOutcome { indices: reindexed, remap, achieved_error })
}

fn apply_remap(indices: &[u32], remap: &[u32]) -> Vec<u32> {
    indices.iter().map(|&i| remap[i as usize]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::DefaultSimplifier;

    fn quad() -> (Vec<u32>, Vec<[f32; 3]>) {
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        (indices, positions)
    }

    #[test]
    fn ratio_one_skips_simplification() {
        let (indices, positions) = quad();
        let importance = vec![0.0; positions.len()];
        let request = SimplifyRequest {
            indices: &indices,
            positions: &positions,
            uvs: None,
            importance: &importance,
            ratio: 1.0,
            importance_threshold: 0.5,
            error_threshold: 0.01,
        };
        let outcome = simplify_primitive(&DefaultSimplifier, &request).expect("simplify");
        assert_eq!(outcome.indices.len(), indices.len());
    }

    #[test]
    fn target_index_count_is_multiple_of_three() {
        let (indices, positions) = quad();
        let importance = vec![0.0; positions.len()];
        let request = SimplifyRequest {
            indices: &indices,
            positions: &positions,
            uvs: None,
            importance: &importance,
            ratio: 0.5,
            importance_threshold: 0.5,
            error_threshold: 1.0,
        };
        let outcome = simplify_primitive(&DefaultSimplifier, &request).expect("simplify");
        assert_eq!(outcome.indices.len() % 3, 0);
    }
}
