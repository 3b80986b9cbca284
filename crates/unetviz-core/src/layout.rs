//! The U-Net diagram
//!
//! A U-shaped encoder/decoder with skip connections, the denoising feedback
//! loop, image encoder and decoder, the text-embedding branch and a preview
//! of the latent space.

use glam::Vec3;
use tracing::{info, warn};

use crate::builder::{Endpoint, ImageCube, PendingCube};
use crate::color::Rgb;
use crate::config::ViewerConfig;
use crate::diagram::Diagram;
use crate::geometry::Geometry;
use crate::material::Material;
use crate::task::{Animations, CancelToken, SliderHandle};

const BLOCK_COLOR: u32 = 0x6495ed;
const CONV_COLOR: u32 = 0x00ff00;
const DOWN_COLOR: u32 = 0xffff00;
const UP_COLOR: u32 = 0xff0000;
const SKIP_COLOR: u32 = 0xff4400;
const LOOP_COLOR: u32 = 0xff00ff;
const LOOP_NODE_COLOR: u32 = 0x00ffff;
const CODER_COLOR: u32 = 0x0000ff;
const IMAGE_FLOW_COLOR: u32 = 0xff3255;
const EMBEDDING_COLOR: u32 = 0x088569;
const EMBEDDING_FLOW_COLOR: u32 = 0x085e28;

const LOOP_BLOCK_SIZE: f32 = 0.6;
const LEVEL_SPACING: f32 = 6.0;
const BLOCK_SPACING: f32 = 2.0;
const LEVEL_DROP: f32 = 1.9;

/// Three quarters of a turn around Z: the cone tip points along -X
const TIP_LEFT: f32 = 4.71;
/// Same plus a half turn: tip along +X
const TIP_RIGHT: f32 = 7.85;

const CONV_CAPTION: &str = "Filters detect patterns (convolution), batch normalization keeps the values \
    stable so training runs smoothly, then ReLU keeps only the positive signal.";
const LOOP_CAPTION: &str = "Loop: the output is fed back in for the next denoising step.";

/// Where a row of blocks ended
#[derive(Debug, Clone, PartialEq)]
pub struct LevelEnd {
    /// X just past the last block, spacing included
    pub next_x: f32,
    pub y: f32,
    pub last_id: String,
}

/// One row of feature-map blocks, `{prefix}_{i}`, joined by convolution arrows.
///
/// Block width is `depth / 64`; height and thickness shrink as it widens so the
/// deep levels stay readable.
pub fn add_level_blocks(diagram: &mut Diagram, prefix: &str, depths: &[u32], start: [f32; 2]) -> LevelEnd {
    let [mut x, y] = start;
    let mut last_id = String::new();

    for (i, &depth) in depths.iter().enumerate() {
        let width = depth as f32 / 64.0;
        let id = format!("{}_{}", prefix, i);
        diagram.add_object(
            &id,
            Geometry::cuboid(width, 3.0 - width / 4.0, 5.0 - width / 2.5),
            Material::translucent(BLOCK_COLOR, 0.8),
            Vec3::new(x + width / 2.0, y, 0.0),
            &block_caption(depth),
            None,
        );

        if i > 0 {
            arrow(
                diagram,
                &format!("{}_convArrow_{}", prefix, i),
                last_id.as_str(),
                id.as_str(),
                CONV_COLOR,
                CONV_CAPTION,
                0.4,
            );
        }

        x += width + BLOCK_SPACING;
        last_id = id;
    }

    LevelEnd { next_x: x, y, last_id }
}

fn block_caption(depth: u32) -> String {
    format!(
        "Each block is a transformed version of the image made of several channels. \
        Every channel picks up a different detail such as shapes, edges or textures, \
        like a stack of images laid on top of each other. Depth: {} channels.",
        depth
    )
}

/// Add an arrow, logging instead of failing when an endpoint is missing
fn arrow(
    diagram: &mut Diagram,
    id: &str,
    from: impl Into<Endpoint>,
    to: impl Into<Endpoint>,
    color: u32,
    caption: &str,
    radius: f32,
) {
    if let Err(err) = diagram.add_arrow(id, from, to, Rgb::from_hex(color), caption, radius) {
        warn!(id = %id, error = %err, "Arrow skipped");
    }
}

fn cube(diagram: &mut Diagram, cube: ImageCube, pending: &mut Vec<PendingCube>) {
    match diagram.add_cube_with_image_face(cube) {
        Ok(handle) => pending.push(handle),
        Err(err) => warn!(error = %err, "Image cube skipped"),
    }
}

/// Build the whole diagram. Image cubes appear once their textures load; the
/// returned handles resolve when they do.
pub fn build_unet_diagram(diagram: &mut Diagram, config: &ViewerConfig) -> Vec<PendingCube> {
    let mut pending = Vec::new();

    // Encoder, going down
    let mut x = -7.0 * LEVEL_SPACING;
    let enc0 = add_level_blocks(diagram, "enc0", &[3, 32, 64], [x + 1.5, 0.0]);
    x += LEVEL_SPACING;
    let enc1 = add_level_blocks(diagram, "enc1", &[64, 64, 128], [x, enc0.y - LEVEL_DROP - 2.0]);
    arrow(
        diagram,
        "arrow0",
        enc0.last_id.as_str(),
        "enc1_0",
        DOWN_COLOR,
        "The image is downsized to pull out what matters most.",
        0.3,
    );

    x += LEVEL_SPACING;
    let enc2 = add_level_blocks(diagram, "enc2", &[128, 128, 256], [x, enc1.y - LEVEL_DROP - 2.0]);
    arrow(
        diagram,
        "arrow1",
        enc1.last_id.as_str(),
        "enc2_0",
        DOWN_COLOR,
        "Compression continues, keeping only the essentials.",
        0.3,
    );

    x += LEVEL_SPACING;
    let enc3 = add_level_blocks(diagram, "enc3", &[256, 256, 512], [x + 2.0, enc2.y - LEVEL_DROP - 1.0]);
    arrow(
        diagram,
        "arrow2",
        enc2.last_id.as_str(),
        "enc3_0",
        DOWN_COLOR,
        "Last compression: a rich summary of the image is all that is left.",
        0.3,
    );

    // Decoder, going up
    x += LEVEL_SPACING;
    let dec3 = add_level_blocks(diagram, "dec3", &[512, 256, 256], [x + 8.0, enc3.y + LEVEL_DROP + 1.0]);
    arrow(
        diagram,
        "arrow3",
        enc3.last_id.as_str(),
        "dec3_0",
        UP_COLOR,
        "Reconstruction starts, bringing back more detail.",
        0.3,
    );

    x += LEVEL_SPACING;
    let dec2 = add_level_blocks(diagram, "dec2", &[256, 128, 128], [x + 18.0, dec3.y + LEVEL_DROP + 2.0]);
    arrow(
        diagram,
        "arrow4",
        dec3.last_id.as_str(),
        "dec2_0",
        UP_COLOR,
        "The image grows again towards its original shape.",
        0.3,
    );

    x += LEVEL_SPACING;
    let dec1 = add_level_blocks(diagram, "dec1", &[128, 64, 64, 3], [x + 22.0, dec2.y + LEVEL_DROP + 2.0]);
    arrow(
        diagram,
        "arrow5",
        dec2.last_id.as_str(),
        "dec1_0",
        UP_COLOR,
        "Final reconstruction step: the output image comes back.",
        0.3,
    );

    // Skip connections all share one id; only the last stays addressable
    arrow(
        diagram,
        "arrow0",
        enc0.last_id.as_str(),
        "dec1_0",
        SKIP_COLOR,
        "Early details are sent across to help the reconstruction.",
        0.12,
    );
    arrow(
        diagram,
        "arrow0",
        enc1.last_id.as_str(),
        "dec2_0",
        SKIP_COLOR,
        "Useful information is carried over from the matching encoder step.",
        0.12,
    );
    arrow(
        diagram,
        "arrow0",
        enc2.last_id.as_str(),
        "dec3_0",
        SKIP_COLOR,
        "Old and new information are combined.",
        0.12,
    );

    // Feedback loop
    x += LEVEL_SPACING;
    diagram.add_object(
        "outLoop",
        Geometry::cuboid(LOOP_BLOCK_SIZE, LOOP_BLOCK_SIZE, LOOP_BLOCK_SIZE),
        Material::translucent(LOOP_NODE_COLOR, 0.7),
        Vec3::new(x + 30.0, dec1.y, 0.0),
        "Output",
        None,
    );
    arrow(diagram, "arrow6", dec1.last_id.as_str(), "outLoop", LOOP_COLOR, "Final convolution", 0.1);

    let loop_right = Vec3::new(30.0, -20.0, 0.0);
    let loop_left = Vec3::new(-45.0, -20.0, 0.0);
    arrow(diagram, "arrowLoop", "outLoop", loop_right, LOOP_COLOR, LOOP_CAPTION, 0.1);
    arrow(diagram, "arrowLoop1", "outLoop", loop_right, LOOP_COLOR, LOOP_CAPTION, 0.1);
    arrow(diagram, "arrowLoop2", loop_right, loop_left, LOOP_COLOR, LOOP_CAPTION, 0.1);
    arrow(
        diagram,
        "arrowLoop3",
        loop_left,
        Vec3::new(-45.0, 0.0, 0.0),
        LOOP_COLOR,
        LOOP_CAPTION,
        0.1,
    );
    diagram.add_object(
        "InLoop",
        Geometry::cuboid(LOOP_BLOCK_SIZE, LOOP_BLOCK_SIZE, LOOP_BLOCK_SIZE),
        Material::translucent(LOOP_NODE_COLOR, 0.7),
        Vec3::new(-45.0, 0.0, 0.0),
        "Input of the next step",
        None,
    );
    arrow(diagram, "arrowLoop4", "InLoop", "enc0_0", LOOP_COLOR, LOOP_CAPTION, 0.1);

    // Image encoder
    cube(
        diagram,
        ImageCube::new("Bruit_enter", config.asset_path("step0.jpeg"))
            .position(Vec3::new(-55.0, 0.0, 0.0))
            .caption("Input image: random noise")
            .face(1)
            .size(1.0, 10.0, 10.0),
        &mut pending,
    );
    diagram.add_object(
        "Encodeur1",
        Geometry::cone(1.5, 2.5),
        Material::translucent(CODER_COLOR, 0.7),
        Vec3::new(-50.0, 0.0, 0.0),
        "The image encoder picks out the main shapes, textures and colors and turns the \
        image into a compact numeric representation the rest of the model can use.",
        Some(Vec3::new(0.0, 0.0, TIP_LEFT)),
    );
    arrow(
        diagram,
        "ImgToEncod",
        Vec3::new(-55.0, 0.0, 0.0),
        "Encodeur1",
        IMAGE_FLOW_COLOR,
        LOOP_CAPTION,
        0.3,
    );
    arrow(diagram, "ImgToEncod", "Encodeur1", "InLoop", IMAGE_FLOW_COLOR, LOOP_CAPTION, 0.2);

    // Image decoder
    diagram.add_object(
        "Decodeur1",
        Geometry::cone(1.5, 2.5),
        Material::translucent(CODER_COLOR, 0.7),
        Vec3::new(35.0, 0.0, 0.0),
        "The decoder finishes by producing an image with three channels (red, green, blue), \
        just like a regular picture. This is where the numeric representation becomes \
        visible again.",
        Some(Vec3::new(0.0, 0.0, TIP_RIGHT)),
    );
    arrow(diagram, "ImgToEncod", "outLoop", "Decodeur1", IMAGE_FLOW_COLOR, "Value passed on", 0.2);
    cube(
        diagram,
        ImageCube::new("Sorti_img", config.asset_path("step9.jpeg"))
            .position(Vec3::new(45.0, 0.0, 0.0))
            .caption("Output image")
            .face(0)
            .size(1.0, 10.0, 10.0),
        &mut pending,
    );
    arrow(
        diagram,
        "ImgToEncod",
        "Decodeur1",
        Vec3::new(45.0, 0.0, 0.0),
        IMAGE_FLOW_COLOR,
        "Value passed on",
        0.3,
    );

    // Text embedding branch
    cube(
        diagram,
        ImageCube::new("embed", config.asset_path("emb.jpeg"))
            .position(Vec3::new(-65.0, 10.0, 0.0))
            .caption("The prompt that guides the generation")
            .face(4)
            .size(30.0, 2.0, 1.0),
        &mut pending,
    );
    diagram.add_object(
        "TextEncodeur",
        Geometry::cone(2.0, 2.5),
        Material::translucent(CODER_COLOR, 0.7),
        Vec3::new(-45.0, 10.0, 0.0),
        "The text encoder turns a sentence or a word into a sequence of numbers that \
        represents its meaning, so the model can compare and relate it.",
        Some(Vec3::new(0.0, 0.0, TIP_LEFT)),
    );
    arrow(
        diagram,
        "ImgToEncod",
        Vec3::new(-50.0, 10.0, 0.0),
        "TextEncodeur",
        IMAGE_FLOW_COLOR,
        "Value passed on",
        0.3,
    );
    diagram.add_object(
        "MatEmbeding",
        Geometry::cuboid(5.0, 5.0, 5.0),
        Material::translucent(EMBEDDING_COLOR, 0.7),
        Vec3::new(-10.0, 10.0, 0.0),
        "The embedding matrix converts each word (token) into numbers that capture its \
        meaning, so words with close meanings get close vectors.\nThink of a smart \
        dictionary that describes each word with numbers instead of words: 'cat' and \
        'dog' end up with similar numbers because they are related.",
        None,
    );
    arrow(
        diagram,
        "embArrow",
        "TextEncodeur",
        "MatEmbeding",
        IMAGE_FLOW_COLOR,
        "Text input goes through the text encoder and is turned into vectors by the \
        embedding matrix, capturing the meaning of the words.",
        0.2,
    );

    let embedding_targets = [
        ("embArrow1", "enc0_2", "Embedding vectors are sent to the first encoder level."),
        ("embArrow2", "enc1_1", "Embedding vectors reach the next encoder level."),
        ("embArrow3", "enc2_1", "The embedding conditions this encoder level as well."),
        ("embArrow4", "enc3_1", "Embedding vectors keep flowing through the deepest encoder level."),
        ("embArrow5", "dec3_1", "The embedding guides the first decoder level during reconstruction."),
        ("embArrow6", "dec2_1", "The embedding reaches the next decoder level."),
        ("embArrow7", "dec1_0", "Finally the embedding conditions the last decoder level."),
    ];
    for (id, target, caption) in embedding_targets {
        arrow(diagram, id, "MatEmbeding", target, EMBEDDING_FLOW_COLOR, caption, 0.1);
    }

    // Latent preview
    cube(
        diagram,
        ImageCube::new(config.slider.target.clone(), config.asset_path("step0.jpeg"))
            .position(Vec3::new(30.0, 13.0, 0.0))
            .caption("What the model currently holds in its latent space")
            .face(config.slider.face)
            .base_color(0x999999)
            .size(17.0, 17.0, 1.0),
        &mut pending,
    );
    arrow(
        diagram,
        "arrowPrevu",
        "outLoop",
        Vec3::new(30.0, 5.0, 0.0),
        LOOP_COLOR,
        "A look into the latent space",
        0.3,
    );

    info!(
        objects = diagram.registry.len(),
        pending_cubes = pending.len(),
        "U-Net diagram built"
    );
    pending
}

/// Ids walked by the highlight animation: every level block, then the output
pub fn highlight_path() -> Vec<String> {
    let levels: [(&str, usize); 7] = [
        ("enc0", 3),
        ("enc1", 3),
        ("enc2", 3),
        ("enc3", 3),
        ("dec3", 3),
        ("dec2", 3),
        ("dec1", 4),
    ];
    levels
        .iter()
        .flat_map(|&(prefix, count)| (0..count).map(move |i| format!("{}_{}", prefix, i)))
        .chain(std::iter::once("outLoop".to_string()))
        .collect()
}

/// Start the highlight walk and the latent preview slider
pub fn start_animations(animations: &mut Animations, config: &ViewerConfig) -> (CancelToken, SliderHandle) {
    let highlight = animations.highlight_sequence(highlight_path(), config.highlight.settings());
    let slider = animations.start_slider(
        config.slider.target.clone(),
        config.slider_images(),
        config.slider.face,
        config.slider.interval(),
    );
    (highlight, slider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;

    #[test]
    fn test_highlight_path() {
        let path = highlight_path();
        assert_eq!(path.len(), 23);
        assert_eq!(path[0], "enc0_0");
        assert_eq!(path[21], "dec1_3");
        assert_eq!(path[22], "outLoop");
    }

    #[test]
    fn test_level_blocks() {
        let mut diagram = Diagram::new();
        let end = add_level_blocks(&mut diagram, "enc3", &[256, 256, 512], [0.0, -5.0]);
        assert_eq!(end.last_id, "enc3_2");
        assert_eq!(end.y, -5.0);
        // 4 + 2 + 4 + 2 + 8 + 2
        assert!((end.next_x - 22.0).abs() < 1e-5);

        let last = diagram.resolve("enc3_2").expect("block registered");
        let node = diagram.scene.node(last).expect("node");
        assert_eq!(node.transform.translation, Vec3::new(16.0, -5.0, 0.0));
        let Some(Geometry::Box { width, height, depth }) = node.as_mesh().map(|m| m.geometry) else {
            panic!("level block should be a box");
        };
        assert_eq!((width, height), (8.0, 1.0));
        assert!((depth - 1.8).abs() < 1e-5);
        assert!(diagram.resolve("enc3_convArrow_1").is_some());
        assert!(diagram.resolve("enc3_convArrow_2").is_some());
    }

    #[test]
    fn test_every_highlight_target_resolves() {
        let mut diagram = Diagram::new();
        build_unet_diagram(&mut diagram, &ViewerConfig::default());
        for id in highlight_path() {
            assert!(diagram.resolve(&id).is_some(), "{} missing", id);
        }
    }

    #[test]
    fn test_shared_ids_keep_last_arrow() {
        let mut diagram = Diagram::new();
        build_unet_diagram(&mut diagram, &ViewerConfig::default());

        // The last "arrow0" is the enc2 -> dec3 skip connection
        let skip = diagram.resolve("arrow0").expect("arrow0");
        assert_eq!(diagram.caption_of(skip), "Old and new information are combined.");
        assert!(matches!(
            diagram.scene.node(skip).map(|n| &n.kind),
            Some(NodeKind::Group { .. })
        ));
        let from = diagram.resolve("enc2_2").and_then(|n| diagram.scene.translation(n));
        assert_eq!(diagram.scene.translation(skip), from);
    }

    #[test]
    fn test_image_cubes_wait_for_textures() {
        let mut diagram = Diagram::new();
        let config = ViewerConfig::default();
        let pending = build_unet_diagram(&mut diagram, &config);
        assert_eq!(pending.len(), 4);
        assert_eq!(diagram.pending_cube_count(), 4);
        assert!(diagram.resolve("preVisu").is_none());

        let mut requests = diagram.drain_texture_requests();
        requests.sort();
        assert_eq!(requests, vec!["img/emb.jpeg", "img/step0.jpeg", "img/step9.jpeg"]);

        diagram.texture_loaded("img/step0.jpeg");
        assert!(diagram.resolve("preVisu").is_some());
        assert!(diagram.resolve("Bruit_enter").is_some());
        assert_eq!(diagram.pending_cube_count(), 2);
    }
}
