//! Prompt construction
//!
//! Builds the outbound request text from the caller's prompt, conversation
//! history, and detected page context, and picks the output-token budget.
//! Pure string templating; the interesting decisions are which context
//! blocks to splice in.

use crate::context;

/// Everything prompt construction needs from the inbound request.
#[derive(Debug, Clone, Default)]
pub struct PromptInput {
    pub prompt: String,
    pub conversation_history: Option<String>,
    pub current_url: Option<String>,
    pub has_image: bool,
}

impl PromptInput {
    fn is_coding_context(&self) -> bool {
        context::detect_coding_context(&self.prompt, self.has_image)
            || self
                .current_url
                .as_deref()
                .is_some_and(context::is_coding_platform)
    }

    fn youtube_video_id(&self) -> Option<&str> {
        self.current_url.as_deref().and_then(context::extract_video_id)
    }

    /// Mode label reported back to the extension.
    pub fn mode(&self) -> &'static str {
        if self.has_image {
            "screen_analysis"
        } else {
            "general_assistant"
        }
    }
}

const SIMPLE_GREETINGS: &[&str] = &["hi", "hello", "hey", "hi!", "hello!", "hey!"];
const SHORT_QUESTIONS: &[&str] = &["how are you", "what's up", "how are you?", "what's up?"];
const SIMPLE_PROMPTS: &[&str] = &["hi", "hello", "hey", "how are you", "what's up"];

/// Output-token budget for a request, from cheapest (greetings) to most
/// expensive (coding solutions, video summaries).
pub fn max_output_tokens(input: &PromptInput) -> u32 {
    if input.is_coding_context() {
        return 4000;
    }
    if input.youtube_video_id().is_some() {
        return 3500;
    }

    let clean = input.prompt.to_lowercase().trim().to_string();
    if SIMPLE_GREETINGS.contains(&clean.as_str())
        || SHORT_QUESTIONS.iter().any(|q| clean.contains(q))
    {
        return 150;
    }
    if clean.len() < 20 && !input.has_image {
        return 300;
    }
    if !input.has_image && clean.len() < 100 {
        return 600;
    }
    if input.has_image || clean.len() >= 100 {
        return 1000;
    }
    600
}

/// Assemble the full instruction text sent alongside the optional screen
/// capture.
pub fn build(input: &PromptInput) -> String {
    let is_coding = input.is_coding_context();
    let is_youtube = input.youtube_video_id().is_some();
    let on_coding_platform = input
        .current_url
        .as_deref()
        .is_some_and(context::is_coding_platform);
    // Any YouTube page gets the summary nudge, even when no video id can be
    // extracted (channel and search pages).
    let on_youtube = input
        .current_url
        .as_deref()
        .is_some_and(context::is_youtube_url);

    let mut text = String::from(BASE_PERSONALITY);

    if is_coding {
        text.push_str(CODING_GUIDELINES);
    }
    if is_youtube {
        text.push_str(YOUTUBE_GUIDELINES);
    }
    text.push_str(SPECIAL_CAPABILITIES);

    if let Some(url) = input.current_url.as_deref() {
        text.push_str(&format!("\n\nCurrent URL: {}", url));
        if on_youtube {
            text.push_str(
                "\n\nThis is a YouTube video. Provide a concise summary with 3-5 key timestamps.",
            );
        }
        if on_coding_platform {
            text.push_str(
                "\n\nUser is on a coding practice platform. Provide thorough, educational coding assistance.",
            );
        }
    }

    if input.has_image {
        text.push_str(
            "\n\nUser's screen provided: Briefly describe what you see on their screen.",
        );
        if is_coding {
            text.push_str(
                " If the screen shows a coding problem, analyze it and provide educational assistance.",
            );
        }
    } else {
        text.push_str("\n\nNo screen: Answer the question based on your knowledge.");
    }

    let clean = input.prompt.to_lowercase();
    let is_simple = SIMPLE_PROMPTS.iter().any(|s| clean.trim().contains(s));
    if is_simple && !is_coding && !is_youtube {
        text.push_str(
            "\n\nIMPORTANT: This is a simple greeting. Respond briefly and naturally - 1-2 sentences maximum.",
        );
    }

    let closing = if is_coding {
        " Focus on educational value and thorough explanations."
    } else if is_youtube {
        " Provide clear video summary with timestamps."
    } else {
        " Be brief and natural."
    };

    if let Some(history) = input.conversation_history.as_deref() {
        format!(
            "{text}\n\nPrevious conversation:\n{history}\n\nCurrent question: {}\n\n\
             Respond naturally and appropriately as Watchwing. ALWAYS use \"screen\" \
             terminology when referring to visual content.{closing}",
            input.prompt
        )
    } else {
        let prompt = if input.prompt.is_empty() {
            "Hello"
        } else {
            &input.prompt
        };
        format!(
            "{text}\n\nUser: {prompt}\n\nRespond appropriately as Watchwing. ALWAYS use \
             \"screen\" terminology when referring to visual content.{closing}"
        )
    }
}

const BASE_PERSONALITY: &str = r#"You are Watchwing - an intelligent AI assistant developed by Bhargav Pattanayak. You have multiple modes:

IMPORTANT TERMINOLOGY RULES:
- ALWAYS use "screen" instead of "image" or "screenshot"
- Refer to it as "your screen" or "the screen"
- Say "I can see on your screen" not "I can see in the image"
- Use "what's on your screen" not "what's in the screenshot"
- Never use words like: image, screenshot, picture, photo, capture

1. SCREEN ANALYSIS: When you receive a screen, briefly describe what's visible on the screen
2. GENERAL ASSISTANT: When no screen, be a helpful AI assistant
3. CODING TUTOR: When helping with coding practice or technical assessments

CRITICAL GUIDELINES:
- Be helpful but CONCISE - avoid long introductions or explanations
- For simple greetings: Respond briefly and naturally
- For screen analysis: Focus on key elements only on the screen
- For general questions: Provide direct, helpful answers
- Use natural, conversational language
- Keep responses appropriate to question length and complexity
- ALWAYS FOLLOW THE TERMINOLOGY RULES ABOVE"#;

const CODING_GUIDELINES: &str = r#"

CODING PRACTICE ASSISTANCE MODE:
You are now in Coding Practice Assistant mode. Help users understand and solve coding problems for learning purposes and generate the entire answer.

ETHICAL GUIDELINES FOR CODING HELP:
1. Provide EXPLANATIONS along with code solutions
2. Focus on TEACHING concepts, not just giving answers
3. Suggest multiple approaches with pros/cons
4. Explain time and space complexity
5. Provide code with comments
6. Encourage learning and understanding
7. Remind users that practice builds real skills

CODING RESPONSE FORMAT:
For coding problems, structure your response as:

[Brief Problem Understanding]
- What the problem is asking
- Key constraints and requirements

[Approach]
1. Explain the algorithm/approach
2. Time Complexity: O(?)
3. Space Complexity: O(?)

[Solution Code]
```[language]
// Well-commented code
// Explain key parts
```

[Key Learning Points]
- What concepts this problem teaches
- How to apply this knowledge
- Common pitfalls to avoid

[Practice Tips]
- Similar problems to try
- Resources for deeper learning"#;

const YOUTUBE_GUIDELINES: &str = r#"

YOUTUBE VIDEO SUMMARIZATION MODE:
You are now in YouTube Video Summarization mode. Provide concise summaries with key timestamps.

VIDEO SUMMARY GUIDELINES:
- Extract 3-5 most important points from the video
- Provide timestamps for each key point (format: [MM:SS])
- Keep summary concise but informative
- Highlight the main message/takeaway
- Use bullet points for clarity

Note: Don't invent timestamps if the video doesn't mention specific times."#;

const SPECIAL_CAPABILITIES: &str = r#"

SPECIAL CAPABILITIES:

VIDEO SUMMARIZATION (YouTube URLs):
- When detecting YouTube URLs, provide brief summaries with key timestamps

GENERAL KNOWLEDGE:
- Answer questions directly and helpfully
- Provide clear explanations without unnecessary detail
- Be conversational and natural

SCREEN ANALYSIS:
- Briefly describe what's visible on the screen
- Focus on main content and key elements on the screen
- Avoid exhaustive descriptions
- ALWAYS use "screen" terminology"#;
