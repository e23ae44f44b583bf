//! Prompt text sent to the completion service.

pub const TRANSCRIBE_INSTRUCTION: &str = "Extract all the text from this image of a flat/image PDF transcript. \
Provide the extracted text only, without any descriptions.";

const RESUME_REQUEST: &str = r#"
What I want to know are:
1. Name
2. Phone
3. Email
4. Address ( Address, city, state, country)
5. Gender
6. Date of birth
7. Skills ( Ex, C++, Java, English language, French language, etc )
8. Education ( Institute name, Year, Marks)
9. Previous Employers ( Date from, date to, Employer name, Role / Designation )
10. Certificates ( CISCO, Microsoft, AWS, Oracle etc )

JSON structure:
{
    "Name": "",
    "Phone": "",
    "Email": "",
    "Address": {
        "Address": "",
        "City": "",
        "State": "",
        "Country": ""
    },
    "Gender": "",
    "Date of Birth": "",
    "Skills": [
        "",
        ...
    ],
    "Education": [
        {
            "Institute Name": "",
            "Year": "",
            "Marks": ""
        },
        ...
    ],
    "Previous Employers": [
        {
            "Date from": "",
            "Date to": "",
            "Employer Name": "",
            "Role/Designation": ""
        },
        ...
    ],
    "Certificates": [
        "",
        ...
    ]
}

When some values are missing, put "N/A" in those fields.
"#;

/// Prompt asking for the full candidate profile of one document.
pub fn resume_prompt(file_name: &str, content: &str) -> String {
    format!(
        "Let me know the following information in JSON format from the given CV/Resume Name & Content:\n\
         \n\
         File Name & Content (the Content was extracted from a PDF file):\n\
         ###\n\
         PDF Name:\n\
         \"{file_name}\"\n\
         PDF Content:\n\
         {content}\n\
         ###\n\
         {RESUME_REQUEST}"
    )
}

pub fn gender_prompt(name: &str) -> String {
    format!(
        "The name is {name}. What is the gender? The answer should be one of ['Male', 'Female', 'Not Sure']\n\
         The answer should be JSON format: {{\"Gender\": ?}}"
    )
}

pub fn email_prompt(email: &str) -> String {
    format!(
        "The email address is {email}. Check if this is the right format and provide me with the correct one.\n\
         The answer should be JSON format: {{\"Email\": ?}}"
    )
}
