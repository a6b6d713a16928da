//! Prompt templates sent to the generator.
//!
//! Every prompt asks for JSON only; replies still go through the extractor
//! because models do not always comply.

pub const IMAGE_EXPENSE: &str = r#"Look at this image (receipt, bill, or expense document).
1. Briefly describe what you see (extracted text / key details).
2. Extract the total expense amount as a number if visible; otherwise use 0.

Return ONLY valid JSON in this exact format:
{"extracted_text": "your description here", "expense": number}"#;

pub const RECEIPT: &str = r#"Analyze this receipt image.
Extract:
- merchant_name
- total_amount (number)
- category (one of: Food, Travel, Utilities, Shopping, EMI, Other)
- payment_method, if visible (otherwise null)
Return ONLY valid JSON with these keys."#;

pub const SALARY_DOCUMENT: &str = r#"This document is either a Salary Slip (payslip) or Form 16 (Indian tax certificate).

First identify which type it is and set "document_kind" to "salary_slip" or "form_16".

For a SALARY SLIP extract:
- employer_name, employee_name, month, year
- gross_salary, basic_salary, hra, special_allowance (if visible)
- deductions: pf, professional_tax, income_tax_tds, other_deductions (as numbers)
- net_salary
- payment_date, if visible

For a FORM 16 extract:
- document_type: "Part A", "Part B" or "Both", if visible
- employer_name, employee_name, pan_employee, pan_employer (if visible)
- assessment_year, period_from, period_to
- gross_salary, deductions_80c, deductions_80d, other_deductions (if visible)
- total_income, tax_deducted_tds, tax_payable (if visible)
- any other key figures in the form

Use null for any field not found. Return ONLY valid JSON with snake_case keys.
Do not include markdown or code fences."#;

pub const VOICE_QUERY: &str = r#"Listen to this audio message about the speaker's finances.
Extract their monthly income, monthly expenses and monthly EMI (loan repayments).
Use 0 for any figure that is not mentioned.

Return ONLY valid JSON in this exact format:
{"transcript": "what the speaker said", "income": number, "expenses": number, "emi": number}"#;

/// Asks the generator to pull income, expenses and EMI out of a chat message.
pub fn chat_extraction(message: &str) -> String {
    format!(
        r#"You are a financial assistant.

Extract income, expenses and emi from the following text.
Return ONLY valid JSON.

Text:
{message}

Format:
{{
  "income": number,
  "expenses": number,
  "emi": number
}}"#
    )
}

pub fn statement(statement_text: &str) -> String {
    format!(
        r#"Analyze this bank statement text.
Provide these JSON keys:
- total_income (number)
- total_expense (number)
- largest_expense_category
- risk_indicator
- summary_advice
Return ONLY valid JSON.

Text:
{statement_text}"#
    )
}

pub fn fraud(message: &str) -> String {
    format!(
        r#"Analyze the following message and decide whether it is likely a financial scam.
Provide these JSON keys:
- risk_level (one of: Low, Medium, High)
- reasons (array of strings)
- recommended_action
Return ONLY valid JSON.

Message:
{message}"#
    )
}

/// Narrative prompt for a goal whose arithmetic is already settled.
pub fn goal_advice(
    income: f64,
    monthly_savings: f64,
    goal_amount: f64,
    years: u32,
    required_monthly_saving: f64,
) -> String {
    format!(
        r#"User earns {income} per month.
Monthly savings: {monthly_savings}.
Goal: {goal_amount} in {years} years.
Required monthly saving: {required_monthly_saving}.

Provide these JSON keys:
- achievable (boolean, with a short reason in "assessment")
- adjustment_needed
- investment_suggestion (Low, Moderate or High risk, with a short rationale)
Return ONLY valid JSON."#
    )
}
