//! Per-vertex importance analysis: two independent analyzers
//! whose scores are merged by element-wise maximum, plus UV-seam detection
//! and the vertex lock mask the simplifier driver consumes.
//!
//! Texture-space importance samples edge/variance maps built from a
//! primitive's bound material images at each vertex's UV. View-space
//! importance rasterizes the whole (normalized) scene from 12 canonical
//! viewpoints and accumulates edge magnitude per triangle, weighted by
//! visibility. Both analyzers are pure functions over already-decoded data;
//! image decoding goes through the injected [`crate::ImageCodec`].

use std::collections::HashMap;
use std::rc::Rc;

use gltf_json as json;

use crate::capability::{DecodedImage, ImageCodec};
use crate::container::Asset;

/// A dense per-vertex importance score in `[0, 1]`, one entry per vertex of
/// a primitive. Built once per (mesh, primitive) and reused across every
/// LOD ratio.
pub type ImportanceMap = Vec<f32>;

/// Memoizes decoded images and their derived edge/variance maps across
/// primitives within one `optimize` call, keyed by `image` index.
#[derive(Default)]
pub struct ImageImportanceCache {
    decoded: HashMap<usize, Option<Rc<DecodedImage>>>,
    maps: HashMap<usize, Rc<Vec<f32>>>,
}

impl ImageImportanceCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn decode(&mut self, asset: &Asset, image_index: usize, codec: &dyn ImageCodec) -> Option<Rc<DecodedImage>> {
        if let Some(cached) = self.decoded.get(&image_index) {
            return cached.clone();
        }
        let result = image_bytes(asset, image_index).and_then(|(bytes, mime)| {
            match codec.decode(&bytes, &mime) {
                Ok(decoded) => Some(Rc::new(decoded)),
                Err(e) => {
                    log::warn!("importance: image {image_index} failed to decode: {e}");
                    None
                }
            }
        });
        self.decoded.insert(image_index, result.clone());
        result
    }

    fn edge_variance_map(&mut self, asset: &Asset, image_index: usize, codec: &dyn ImageCodec) -> Option<Rc<Vec<f32>>> {
        if let Some(map) = self.maps.get(&image_index) {
            return Some(map.clone());
        }
        let decoded = self.decode(asset, image_index, codec)?;
        let map = Rc::new(build_image_importance(&decoded));
        self.maps.insert(image_index, map.clone());
        Some(map)
    }
}

/// Resolves an image's raw bytes and MIME type, from either its bufferView
/// or a `data:` URI. Returns `None` for external-URI images (unsupported;
/// the pipeline treats them as contributing nothing to importance).
fn image_bytes(asset: &Asset, image_index: usize) -> Option<(Vec<u8>, String)> {
    let image = asset.root.images.get(image_index)?;
    if let Some(view) = image.buffer_view {
        let bytes = asset.buffer_view_slice(view).ok()?.to_vec();
        let mime = image.mime_type.as_ref().map(|m| m.0.clone()).unwrap_or_default();
        return Some((bytes, mime));
    }
    let uri = image.uri.as_ref()?;
    let data = uri.strip_prefix("data:")?;
    let (header, payload) = data.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    let mime = header.trim_end_matches(";base64").to_string();
    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, payload).ok()?;
    Some((bytes, mime))
}

/// Per-texture-role weight used when combining a primitive's bound images
/// into one importance signal for texture-space importance.
fn role_weight(role: TextureRole) -> f32 {
    match role {
        TextureRole::BaseColor => 1.0,
        TextureRole::Normal => 2.0,
        TextureRole::MetallicRoughness => 0.5,
        TextureRole::Occlusion => 0.3,
        TextureRole::Emissive => 0.5,
    }
}

#[derive(Clone, Copy)]
enum TextureRole {
    BaseColor,
    Normal,
    MetallicRoughness,
    Occlusion,
    Emissive,
}

fn material_images(root: &json::Root, material_index: usize) -> Vec<(usize, TextureRole)> {
    let mut out = Vec::new();
    let Some(material) = root.materials.get(material_index) else {
        return out;
    };
    let mut push = |info_texture: usize, role: TextureRole| {
        if let Some(texture) = root.textures.get(info_texture) {
            out.push((texture.source.value(), role));
        }
    };
    let pbr = &material.pbr_metallic_roughness;
    if let Some(tex) = &pbr.base_color_texture {
        push(tex.index.value(), TextureRole::BaseColor);
    }
    if let Some(tex) = &pbr.metallic_roughness_texture {
        push(tex.index.value(), TextureRole::MetallicRoughness);
    }
    if let Some(tex) = &material.normal_texture {
        push(tex.index.value(), TextureRole::Normal);
    }
    if let Some(tex) = &material.occlusion_texture {
        push(tex.index.value(), TextureRole::Occlusion);
    }
    if let Some(tex) = &material.emissive_texture {
        push(tex.index.value(), TextureRole::Emissive);
    }
    out
}

/// Texture-space importance: for each vertex, bilinearly sample
/// every bound image's edge/variance map at its UV, weighted by texture
/// role, normalized to `[0, 1]` across the primitive.
///
/// Returns `None` when the primitive has no UVs, no material, or the
/// material binds no textures the cache can decode.
pub fn texture_space_importance(
    asset: &Asset,
    material_index: Option<usize>,
    uvs: Option<&[[f32; 2]]>,
    vertex_count: usize,
    codec: &dyn ImageCodec,
    cache: &mut ImageImportanceCache,
) -> Option<ImportanceMap> {
    let material_index = material_index?;
    let uvs = uvs?;
    let images = material_images(&asset.root, material_index);
    if images.is_empty() {
        return None;
    }

    let mut maps = Vec::new();
    for (image_index, role) in images {
        if let Some(map) = cache.edge_variance_map(asset, image_index, codec) {
            let dims = asset_image_dims(asset, image_index, codec, cache);
            if let Some((w, h)) = dims {
                maps.push((map, w, h, role_weight(role)));
            }
        }
    }
    if maps.is_empty() {
        return None;
    }

    let mut scores = vec![0.0f32; vertex_count];
    let total_weight: f32 = maps.iter().map(|(_, _, _, w)| w).sum();
    for v in 0..vertex_count {
        let uv = uvs.get(v).copied().unwrap_or([0.0, 0.0]);
        let u = uv[0].rem_euclid(1.0);
        let vv = uv[1].rem_euclid(1.0);
        let mut sum = 0.0f32;
        for (map, w, h, weight) in &maps {
            sum += bilinear_sample(map, *w, *h, u, vv) * weight;
        }
        scores[v] = sum / total_weight;
    }
    normalize_max(&mut scores);
    Some(scores)
}

fn asset_image_dims(
    asset: &Asset,
    image_index: usize,
    codec: &dyn ImageCodec,
    cache: &mut ImageImportanceCache,
) -> Option<(u32, u32)> {
    cache.decode(asset, image_index, codec).map(|d| (d.width, d.height))
}

/// Builds a dense per-pixel importance map for one decoded image: Sobel
/// edge magnitude (weight 0.6) plus local 5x5 colour variance (weight 0.4),
/// each clamped to `[0, 1]` before combining.
fn build_image_importance(image: &DecodedImage) -> Vec<f32> {
    let (w, h) = (image.width as usize, image.height as usize);
    let gray = to_grayscale(&image.rgba8, w, h);
    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let edge = sobel_magnitude(&gray, w, h, x, y).clamp(0.0, 1.0);
            let variance = local_variance(&gray, w, h, x, y, 2).clamp(0.0, 1.0);
            out[y * w + x] = 0.6 * edge + 0.4 * variance;
        }
    }
    out
}

fn to_grayscale(rgba8: &[u8], w: usize, h: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; w * h];
    for i in 0..w * h {
        let r = rgba8[i * 4] as f32 / 255.0;
        let g = rgba8[i * 4 + 1] as f32 / 255.0;
        let b = rgba8[i * 4 + 2] as f32 / 255.0;
        out[i] = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    }
    out
}

fn sample_clamped(buf: &[f32], w: usize, h: usize, x: i64, y: i64) -> f32 {
    let x = x.clamp(0, w as i64 - 1) as usize;
    let y = y.clamp(0, h as i64 - 1) as usize;
    buf[y * w + x]
}

/// Sobel edge magnitude at one pixel, clamping the sampling window to the
/// image border.
pub(crate) fn sobel_magnitude(buf: &[f32], w: usize, h: usize, x: usize, y: usize) -> f32 {
    let (x, y) = (x as i64, y as i64);
    let gx = -sample_clamped(buf, w, h, x - 1, y - 1) - 2.0 * sample_clamped(buf, w, h, x - 1, y)
        - sample_clamped(buf, w, h, x - 1, y + 1)
        + sample_clamped(buf, w, h, x + 1, y - 1)
        + 2.0 * sample_clamped(buf, w, h, x + 1, y)
        + sample_clamped(buf, w, h, x + 1, y + 1);
    let gy = -sample_clamped(buf, w, h, x - 1, y - 1) - 2.0 * sample_clamped(buf, w, h, x, y - 1)
        - sample_clamped(buf, w, h, x + 1, y - 1)
        + sample_clamped(buf, w, h, x - 1, y + 1)
        + 2.0 * sample_clamped(buf, w, h, x, y + 1)
        + sample_clamped(buf, w, h, x + 1, y + 1);
    (gx * gx + gy * gy).sqrt() / 8.0
}

fn local_variance(buf: &[f32], w: usize, h: usize, x: usize, y: usize, radius: i64) -> f32 {
    let (x, y) = (x as i64, y as i64);
    let mut sum = 0.0f32;
    let mut sum_sq = 0.0f32;
    let mut count = 0.0f32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let v = sample_clamped(buf, w, h, x + dx, y + dy);
            sum += v;
            sum_sq += v * v;
            count += 1.0;
        }
    }
    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

fn bilinear_sample(map: &[f32], w: usize, h: usize, u: f32, v: f32) -> f32 {
    let fx = u * (w as f32 - 1.0);
    let fy = v * (h as f32 - 1.0);
    let x0 = fx.floor() as i64;
    let y0 = fy.floor() as i64;
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;
    let v00 = sample_clamped(map, w, h, x0, y0);
    let v10 = sample_clamped(map, w, h, x0 + 1, y0);
    let v01 = sample_clamped(map, w, h, x0, y0 + 1);
    let v11 = sample_clamped(map, w, h, x0 + 1, y0 + 1);
    let top = v00 * (1.0 - tx) + v10 * tx;
    let bottom = v01 * (1.0 - tx) + v11 * tx;
    top * (1.0 - ty) + bottom * ty
}

fn normalize_max(scores: &mut [f32]) {
    let max = scores.iter().cloned().fold(0.0f32, f32::max);
    if max > 0.0 {
        for s in scores.iter_mut() {
            *s /= max;
        }
    }
}

/// Resolution of each view-space canonical render.
const VIEW_RESOLUTION: usize = 512;

/// A mesh/primitive-local triangle ready for view-space rendering.
struct SceneTriangle {
    mesh: usize,
    primitive: usize,
    local_vertices: [u32; 3],
    positions: [[f32; 3]; 3],
    normal: [f32; 3],
}

/// One primitive's positions and (optional) vertex normals, as read by the
/// pipeline's ingest stage, keyed by `(mesh, primitive)`.
pub struct PrimitiveGeometry {
    /// Mesh index.
    pub mesh: usize,
    /// Primitive index within the mesh.
    pub primitive: usize,
    /// Triangle-list indices (already expanded/decoded to `u32`).
    pub indices: Vec<u32>,
    /// `POSITION` attribute, one entry per vertex.
    pub positions: Vec<[f32; 3]>,
    /// `NORMAL` attribute, if present.
    pub normals: Option<Vec<[f32; 3]>>,
}

/// View-space importance: renders the whole normalized scene
/// from 12 canonical viewpoints, accumulating Sobel edge magnitude per
/// triangle weighted by visibility, then projects per-triangle scores to
/// per-vertex by averaging incident triangles.
///
/// Operates in each primitive's local (un-transformed) space: node
/// transforms are not applied, since the analyzer only needs a scene-scale
/// bounding box to normalize into a unit cube, not true world placement.
pub fn view_space_importance(geometries: &[PrimitiveGeometry]) -> HashMap<(usize, usize), ImportanceMap> {
    let triangles = collect_triangles(geometries);
    if triangles.is_empty() {
        return HashMap::new();
    }

    let (center, scale) = scene_bounds(&triangles);
    let normalized: Vec<[[f32; 3]; 3]> = triangles
        .iter()
        .map(|t| {
            let mut verts = t.positions;
            for v in verts.iter_mut() {
                for axis in 0..3 {
                    v[axis] = (v[axis] - center[axis]) * scale;
                }
            }
            verts
        })
        .collect();

    let tri_count = triangles.len();
    let mut importance_accum = vec![0.0f32; tri_count];
    let mut visibility = vec![0u32; tri_count];

    for dir in canonical_view_directions() {
        render_view(dir, &normalized, &triangles, &mut importance_accum, &mut visibility);
    }

    let mut per_triangle = vec![0.0f32; tri_count];
    for i in 0..tri_count {
        per_triangle[i] = if visibility[i] > 0 {
            importance_accum[i] / visibility[i] as f32
        } else {
            0.0
        };
    }

    // Normalize per-primitive, then project to per-vertex by averaging
    // incident triangles.
    let mut by_primitive: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (i, t) in triangles.iter().enumerate() {
        by_primitive.entry((t.mesh, t.primitive)).or_default().push(i);
    }

    let mut result = HashMap::new();
    for geom in geometries {
        let key = (geom.mesh, geom.primitive);
        let vertex_count = geom.positions.len();
        let mut scores = vec![0.0f32; vertex_count];
        let Some(tri_indices) = by_primitive.get(&key) else {
            result.insert(key, scores);
            continue;
        };

        let mut local_max = 0.0f32;
        for &i in tri_indices {
            local_max = local_max.max(per_triangle[i]);
        }

        let mut accum = vec![0.0f32; vertex_count];
        let mut counts = vec![0u32; vertex_count];
        for &i in tri_indices {
            let normalized_score = if local_max > 0.0 { per_triangle[i] / local_max } else { 0.0 };
            for &local_v in &triangles[i].local_vertices {
                let local_v = local_v as usize;
                accum[local_v] += normalized_score;
                counts[local_v] += 1;
            }
        }
        for v in 0..vertex_count {
            scores[v] = if counts[v] > 0 { accum[v] / counts[v] as f32 } else { 0.0 };
        }
        result.insert(key, scores);
    }
    result
}

fn collect_triangles(geometries: &[PrimitiveGeometry]) -> Vec<SceneTriangle> {
    let mut triangles = Vec::new();
    for geom in geometries {
        for tri in geom.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]];
            let positions = [
                geom.positions[a as usize],
                geom.positions[b as usize],
                geom.positions[c as usize],
            ];
            let normal = geom
                .normals
                .as_ref()
                .map(|normals| {
                    average3(normals[a as usize], normals[b as usize], normals[c as usize])
                })
                .unwrap_or_else(|| face_normal(&positions));
            triangles.push(SceneTriangle {
                mesh: geom.mesh,
                primitive: geom.primitive,
                local_vertices: [a, b, c],
                positions,
                normal,
            });
        }
    }
    triangles
}

fn average3(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let sum = [a[0] + b[0] + c[0], a[1] + b[1] + c[1], a[2] + b[2] + c[2]];
    normalize(sum)
}

fn face_normal(p: &[[f32; 3]; 3]) -> [f32; 3] {
    let e1 = sub(p[1], p[0]);
    let e2 = sub(p[2], p[0]);
    normalize(cross(e1, e2))
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

fn scene_bounds(triangles: &[SceneTriangle]) -> ([f32; 3], f32) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for t in triangles {
        for p in &t.positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
    }
    let center = [
        (min[0] + max[0]) / 2.0,
        (min[1] + max[1]) / 2.0,
        (min[2] + max[2]) / 2.0,
    ];
    let max_dim = (0..3).map(|axis| max[axis] - min[axis]).fold(0.0f32, f32::max);
    let scale = if max_dim > 0.0 { 2.0 / max_dim } else { 1.0 };
    (center, scale)
}

/// The 12 canonical viewpoints: 6 axial plus 8 cube-diagonal directions.
fn canonical_view_directions() -> Vec<[f32; 3]> {
    let mut dirs = vec![
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
    ];
    let d = 1.0 / 3.0f32.sqrt();
    for &sx in &[-1.0f32, 1.0] {
        for &sy in &[-1.0f32, 1.0] {
            for &sz in &[-1.0f32, 1.0] {
                dirs.push([sx * d, sy * d, sz * d]);
            }
        }
    }
    dirs
}

fn render_view(
    dir: [f32; 3],
    normalized: &[[[f32; 3]; 3]],
    triangles: &[SceneTriangle],
    importance_accum: &mut [f32],
    visibility: &mut [u32],
) {
    let up_hint = if dir[1].abs() > 0.99 { [0.0, 0.0, 1.0] } else { [0.0, 1.0, 0.0] };
    let right = normalize(cross(up_hint, dir));
    let up = cross(dir, right);

    const RES: usize = VIEW_RESOLUTION;
    let half_extent = 3.0f32.sqrt();
    let mut id_buffer = vec![-1i32; RES * RES];
    let mut depth_buffer = vec![f32::INFINITY; RES * RES];
    let mut shade_buffer = vec![0.0f32; RES * RES];

    let to_screen = |v: [f32; 3]| -> (f32, f32, f32) {
        let x = dot(v, right);
        let y = dot(v, up);
        let depth = -dot(v, dir);
        let sx = ((x / half_extent) + 1.0) / 2.0 * (RES as f32 - 1.0);
        let sy = ((y / half_extent) + 1.0) / 2.0 * (RES as f32 - 1.0);
        (sx, sy, depth)
    };

    for (tri_id, verts) in normalized.iter().enumerate() {
        let shade = dot(triangles[tri_id].normal, dir).abs();
        let screen: Vec<(f32, f32, f32)> = verts.iter().map(|&v| to_screen(v)).collect();
        rasterize_triangle(&screen, tri_id, shade, RES, &mut id_buffer, &mut depth_buffer, &mut shade_buffer);
    }

    for pixel in 0..RES * RES {
        let tri_id = id_buffer[pixel];
        if tri_id < 0 {
            continue;
        }
        let x = pixel % RES;
        let y = pixel / RES;
        let edge = sobel_magnitude(&shade_buffer, RES, RES, x, y);
        importance_accum[tri_id as usize] += edge;
        visibility[tri_id as usize] += 1;
    }
}

#[allow(clippy::too_many_arguments)]
fn rasterize_triangle(
    screen: &[(f32, f32, f32)],
    tri_id: usize,
    shade: f32,
    res: usize,
    id_buffer: &mut [i32],
    depth_buffer: &mut [f32],
    shade_buffer: &mut [f32],
) {
    let (x0, y0, z0) = screen[0];
    let (x1, y1, z1) = screen[1];
    let (x2, y2, z2) = screen[2];

    let min_x = x0.min(x1).min(x2).floor().max(0.0) as usize;
    let max_x = (x0.max(x1).max(x2).ceil() as i64).clamp(0, res as i64 - 1) as usize;
    let min_y = y0.min(y1).min(y2).floor().max(0.0) as usize;
    let max_y = (y0.max(y1).max(y2).ceil() as i64).clamp(0, res as i64 - 1) as usize;
    if min_x > max_x || min_y > max_y {
        return;
    }

    let area = edge_fn(x0, y0, x1, y1, x2, y2);
    if area.abs() < 1e-8 {
        return;
    }

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let w0 = edge_fn(x1, y1, x2, y2, px, py) / area;
            let w1 = edge_fn(x2, y2, x0, y0, px, py) / area;
            let w2 = edge_fn(x0, y0, x1, y1, px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let depth = w0 * z0 + w1 * z1 + w2 * z2;
            let idx = y * res + x;
            if depth < depth_buffer[idx] {
                depth_buffer[idx] = depth;
                id_buffer[idx] = tri_id as i32;
                shade_buffer[idx] = shade;
            }
        }
    }
}

fn edge_fn(ax: f32, ay: f32, bx: f32, by: f32, px: f32, py: f32) -> f32 {
    (px - ax) * (by - ay) - (py - ay) * (bx - ax)
}

/// Merges texture-space and view-space scores by element-wise maximum
/// Either input may be absent for a given primitive.
pub fn merge(texture: Option<&ImportanceMap>, view: Option<&ImportanceMap>, vertex_count: usize) -> ImportanceMap {
    let mut out = vec![0.0f32; vertex_count];
    if let Some(t) = texture {
        for (o, &v) in out.iter_mut().zip(t) {
            *o = o.max(v);
        }
    }
    if let Some(v) = view {
        for (o, &s) in out.iter_mut().zip(v) {
            *o = o.max(s);
        }
    }
    out
}

/// UV-seam detection: vertices that share a quantized position
/// (4 decimal places) but differ in quantized UV (3 decimal places) are
/// marked as seams on both sides of the pair.
pub fn seam_vertices(positions: &[[f32; 3]], uvs: Option<&[[f32; 2]]>) -> Vec<bool> {
    let mut seams = vec![false; positions.len()];
    let Some(uvs) = uvs else {
        return seams;
    };

    let mut by_position: HashMap<[i64; 3], Vec<usize>> = HashMap::new();
    for (i, p) in positions.iter().enumerate() {
        let key = [
            (p[0] * 1e4).round() as i64,
            (p[1] * 1e4).round() as i64,
            (p[2] * 1e4).round() as i64,
        ];
        by_position.entry(key).or_default().push(i);
    }

    for group in by_position.values() {
        if group.len() < 2 {
            continue;
        }
        let quantized_uv = |i: usize| {
            let uv = uvs[i];
            [(uv[0] * 1e3).round() as i64, (uv[1] * 1e3).round() as i64]
        };
        let first = quantized_uv(group[0]);
        if group.iter().any(|&i| quantized_uv(i) != first) {
            for &i in group {
                seams[i] = true;
            }
        }
    }
    seams
}

/// Vertex lock mask: seam vertices use half the importance
/// threshold, since collapsing them creates visible material tears.
pub fn vertex_lock_mask(importance: &ImportanceMap, seams: &[bool], threshold: f32) -> Vec<bool> {
    importance
        .iter()
        .zip(seams)
        .map(|(&score, &seam)| if seam { score > 0.5 * threshold } else { score > threshold })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seams_detected_across_shared_position() {
        // Two vertices at the same position with different UVs (a seam);
        // a third vertex elsewhere is untouched.
        let positions = [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let uvs = [[0.0, 0.0], [1.0, 1.0], [0.5, 0.5]];
        let seams = seam_vertices(&positions, Some(&uvs));
        assert!(seams[0]);
        assert!(seams[1]);
        assert!(!seams[2]);
    }

    #[test]
    fn no_seams_without_uvs() {
        let positions = [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let seams = seam_vertices(&positions, None);
        assert_eq!(seams, vec![false, false]);
    }

    #[test]
    fn lock_mask_uses_half_threshold_on_seams() {
        let importance = vec![0.3, 0.3];
        let seams = vec![true, false];
        let lock = vertex_lock_mask(&importance, &seams, 0.5);
        assert!(lock[0], "seam vertex above half-threshold should lock");
        assert!(!lock[1], "non-seam vertex below full threshold should not lock");
    }

    #[test]
    fn merge_takes_elementwise_max() {
        let a = vec![0.2, 0.9];
        let b = vec![0.5, 0.1];
        let merged = merge(Some(&a), Some(&b), 2);
        assert_eq!(merged, vec![0.5, 0.9]);
    }

    #[test]
    fn view_space_importance_is_nonempty_for_a_single_triangle() {
        let geom = PrimitiveGeometry {
            mesh: 0,
            primitive: 0,
            indices: vec![0, 1, 2],
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: None,
        };
        let result = view_space_importance(&[geom]);
        let scores = result.get(&(0, 0)).expect("primitive must be present");
        assert_eq!(scores.len(), 3);
    }
}
