// src/core/prompt.rs — Prompt assembly for test-case generation

/// System message for every generation call.
pub const SYSTEM_PROMPT: &str = "You are an expert QA engineer generating well-structured software test cases in JSON format.";

// The user prompt is one-shot: a fixed worked example (use case plus the
// test cases a tester wrote for it) followed by the caller's project
// description and use case. The example is inlined verbatim so the model
// sees the exact target shape, quirks included.
const PROMPT_LEAD: &str = r#"You are a tester tasked with creating comprehensive test cases for a given usecase description.

## Project description
The project encompasses a comprehensive online educational platform designed for students seeking to enhance their learning experiences through various functionalities. Key features include account registration, course enrollment, participation in live classes, accessing recorded lectures and eBooks, taking quizzes, and viewing progress reports. The platform also facilitates personalized interactions through smart notes and guidelines for extra-curricular activities. With a focus on user engagement and academic support, the project incorporates multiple use cases that address both student and user requirements, ensuring that users can efficiently navigate their educational journey, manage personal information, and receive timely support. Through rigorous testing scenarios, the platform aims to provide a seamless and effective learning environment, accommodating the diverse needs of students and educators alike.

## Usecase description

{
    "name": "Changing Personal Information",
    "scenario": "A user wants to change or update his personal information",
    "actors": "User",
    "preconditions": "User must login to his account",
    "steps": [
        "User logs in to his account",
        "User navigates to his profile settings",
        "User clicks on the button to edit personal information",
        "User updates the personal information (i.e Name, Gender, Birthday, Class Shift, Institution, Guadian's Name, Guadian's Mobile Number)"
    ]
}

## Testcase

[
    {
        "name": "Successful Personal Information Update",
        "description": "Verify that a user can successfully update his personal information",
        "input": {
            "userId": "user_12345",
            "name": "John Doe",
            "gender": "Male",
            "birthday": "1990-01-01",
            "classShift": "Morning",
            "institution": "ABC School",
            "guardianName": "Jane Doe",
            "guardianMobile": "01712345678"
        },
        "expected": {
            "outcome": "Personal information update successful",
            "status": "Information Updated"
        }
    },
    {
        "name": "Failed Personal Information Update",
        "description": "Verify that a user cannot update his personal information if any of the provided information is empty",
        "input": {
            "userId": "user_12345",
            "name": "John Doe",
            "gender": null,
            "birthday": "1990-01-01",
            "classShift": "Morning",
            "institution": "ABC School",
            "guardianName": "Jane Doe",
            "guardianMobile": "01712345678"
        },
        "expected": {
            "outcome": "Personal information update failed",
            "status": "Incorrect Information"
        }
    }
]

## Project description
"#;

const PROMPT_MID: &str = r#"

## Usecase description
"#;

const PROMPT_TAIL: &str = r#"

## Testcase


--------
**Important Instruction:**
    - Understand the last usecase.
    - Generate test cases similar to the given example that covers both:
        - **Normal** and **Edge** case scenarios
        - **Positive** and **Negative** case scenarios
        - **Valid** and **Invalid** case scenarios
    - Do not add any explanation or any unnecessary word.
    - Your generated testcase must be json parsable and must follow the style of the given example.
"#;

/// Assemble the one-shot user prompt around the caller's use case text and
/// project description. `usecase` is whatever context the caller retrieved
/// (or the raw use case when retrieval is off).
pub fn build_prompt(usecase: &str, project_description: &str) -> String {
    [PROMPT_LEAD, project_description, PROMPT_MID, usecase, PROMPT_TAIL].concat()
}
