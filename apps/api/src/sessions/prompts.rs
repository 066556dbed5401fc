// Prompt constants for setup validation.

pub const JOB_TITLE_SYSTEM: &str =
    "You are a precise classifier. Answer with a single character and nothing else.";

/// Replace `{job_title}` before sending.
pub const JOB_TITLE_PROMPT_TEMPLATE: &str =
    "Is '{job_title}' a job title? Return 1 if it is, 0 otherwise, don't return other things.";
