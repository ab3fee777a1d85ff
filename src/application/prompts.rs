//! Vision Prompts - 视觉模型提示词

/// 系统提示词：约束输出格式
pub const SYSTEM_PROMPT: &str = r#"You are an expert 3D printing quality inspector watching a live camera feed of an FDM printer.
Respond ONLY with a JSON object in a ```json fenced code block using this exact schema:
{
  "objects": [
    {"name": "string", "bounding_box": [x1, y1, x2, y2], "confidence": 0.0}
  ],
  "problems": [
    {"issue": "string", "reason": "string", "bounding_box": [x1, y1, x2, y2], "confidence": 0.0}
  ],
  "overall_status": "good | warning | critical | error"
}
Bounding box coordinates are normalized to 0..1 relative to the image width and height.
Confidence values are between 0 and 1."#;

/// 用户提示词：描述要检查的问题
pub const USER_PROMPT: &str = "Inspect this frame from the printer camera. \
Identify visible objects (print head, bed, printed part) and any print-quality problems such as \
spaghetti, warping, layer shifts, stringing, blobs, bed adhesion failure, nozzle clogs or detached parts. \
Only report problems you can actually see. If the print looks fine, return an empty problems list \
with overall_status \"good\".";
