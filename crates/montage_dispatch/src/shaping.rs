//! Shapes a scene into the request one backend can accept.

use montage_core::{BackendCapabilities, ConsistencyMarkers, DispatchConfig, Scene, VideoInput};
use montage_error::{VideoBackendError, VideoBackendErrorKind};
use montage_interface::{VideoRequest, VideoRequestBuilder};
use tracing::debug;

/// Build the video request for a scene on a backend with `capabilities`.
///
/// Only inputs the backend accepts are sent. When both a start and an end
/// frame are sent, the generic reference image is withheld so the backend
/// cannot favor it over the end-frame constraint. With one frame or none,
/// the reference is included, as a one-element list for backends that only
/// take multiple references. Duration and aspect ratio are snapped to the
/// backend's constraints.
///
/// # Errors
///
/// Returns [`VideoBackendErrorKind::InvalidRequest`] when the scene has no
/// prompt to send.
///
/// # Examples
///
/// ```
/// use montage_core::{
///     ArtifactRef, BackendCapabilitiesBuilder, ChainKind, ConsistencyMarkers, DispatchConfig,
///     SceneBuilder, VideoInput,
/// };
/// use montage_dispatch::shape_request;
///
/// let mut scene = SceneBuilder::default()
///     .scene_number(1u32)
///     .detailed_prompt("A kettle on a stove")
///     .duration_seconds(6u32)
///     .build()
///     .unwrap();
/// scene.attach_image(ChainKind::Reference, ArtifactRef::image("ref.png"));
/// scene.attach_image(ChainKind::StartFrame, ArtifactRef::image("start.png"));
/// scene.attach_image(ChainKind::EndFrame, ArtifactRef::image("end.png"));
///
/// let caps = BackendCapabilitiesBuilder::default()
///     .accepted_inputs(
///         [VideoInput::ReferenceImage, VideoInput::StartImage, VideoInput::EndImage]
///             .into_iter()
///             .collect::<std::collections::BTreeSet<_>>(),
///     )
///     .build()
///     .unwrap();
///
/// let request = shape_request(&scene, &ConsistencyMarkers::default(), &caps, &DispatchConfig::default(), 7).unwrap();
/// assert!(request.start_image().is_some() && request.end_image().is_some());
/// assert!(!request.has_reference());
/// ```
pub fn shape_request(
    scene: &Scene,
    markers: &ConsistencyMarkers,
    capabilities: &BackendCapabilities,
    config: &DispatchConfig,
    seed: u64,
) -> Result<VideoRequest, VideoBackendError> {
    let scene_number = *scene.scene_number();
    let invalid = |message: String| {
        VideoBackendError::new(VideoBackendErrorKind::InvalidRequest {
            scene_number,
            message,
        })
    };
    if scene.detailed_prompt().trim().is_empty() {
        return Err(invalid("scene prompt is empty".to_string()));
    }

    let start = scene
        .start_image()
        .clone()
        .filter(|_| capabilities.accepts(VideoInput::StartImage));
    let end = scene
        .end_image()
        .clone()
        .filter(|_| capabilities.accepts(VideoInput::EndImage));

    let framed = start.is_some() && end.is_some();
    let reference = scene.reference_image().clone().filter(|_| !framed);
    let (reference_image, reference_images) = match reference {
        Some(image) if capabilities.accepts(VideoInput::ReferenceImage) => (Some(image), Vec::new()),
        Some(image) if capabilities.accepts(VideoInput::MultiReferenceImages) => {
            (None, vec![image])
        }
        _ => (None, Vec::new()),
    };

    let duration = capabilities.shape_duration(*scene.duration_seconds());
    let aspect_ratio = capabilities.shape_aspect_ratio(*config.aspect_ratio());
    debug!(
        scene = scene_number,
        start = start.is_some(),
        end = end.is_some(),
        reference = reference_image.is_some() || !reference_images.is_empty(),
        requested_seconds = scene.duration_seconds(),
        duration,
        %aspect_ratio,
        "Shaped video request"
    );

    VideoRequestBuilder::default()
        .prompt(markers.augment(scene.detailed_prompt()))
        .reference_image(reference_image)
        .reference_images(reference_images)
        .start_image(start)
        .end_image(end)
        .duration_seconds(duration)
        .aspect_ratio(aspect_ratio)
        .resolution(config.resolution().clone())
        .seed(seed)
        .build()
        .map_err(|e| invalid(e.to_string()))
}
