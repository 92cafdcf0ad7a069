//! Dashboard aggregates: headline totals plus the per-department and per-role
//! breakdowns behind the two charts.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{Department, Employee, JobApplication};

pub const ALL: &str = "all";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardFilter {
    pub department: Option<String>,
    pub role: Option<String>,
}

impl DashboardFilter {
    fn selected(value: &Option<String>) -> Option<&str> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(ALL))
    }

    fn department(&self) -> Option<&str> {
        Self::selected(&self.department)
    }

    fn role(&self) -> Option<&str> {
        Self::selected(&self.role)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub employees: usize,
    pub applicants: usize,
    pub departments: usize,
    pub roles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub totals: Totals,
    pub employees_by_department: BTreeMap<String, usize>,
    pub applications_by_role: BTreeMap<String, usize>,
    pub department_options: Vec<String>,
    pub role_options: Vec<String>,
}

/// Employees are filtered by department and role; applications by role only.
pub fn summarize(
    employees: &[Employee],
    applications: &[JobApplication],
    departments: &[Department],
    filter: &DashboardFilter,
) -> DashboardSummary {
    let dept_filter = filter.department();
    let role_filter = filter.role();

    let filtered_employees: Vec<&Employee> = employees
        .iter()
        .filter(|e| dept_filter.map_or(true, |d| e.department == d))
        .filter(|e| role_filter.map_or(true, |r| e.role == r))
        .collect();
    let filtered_applications: Vec<&JobApplication> = applications
        .iter()
        .filter(|a| role_filter.map_or(true, |r| a.role.label() == r))
        .collect();

    let mut employees_by_department = BTreeMap::new();
    for e in &filtered_employees {
        *employees_by_department.entry(e.department.clone()).or_insert(0) += 1;
    }
    let mut applications_by_role = BTreeMap::new();
    for a in &filtered_applications {
        *applications_by_role.entry(a.role.label().to_string()).or_insert(0) += 1;
    }

    let distinct_roles: BTreeSet<&str> = filtered_employees.iter().map(|e| e.role.as_str()).collect();

    let mut department_options: Vec<String> = departments.iter().map(|d| d.name.clone()).collect();
    department_options.sort();
    let all_roles: BTreeSet<&str> = employees.iter().map(|e| e.role.as_str()).collect();

    DashboardSummary {
        totals: Totals {
            employees: filtered_employees.len(),
            applicants: filtered_applications.len(),
            departments: employees_by_department.len(),
            roles: distinct_roles.len(),
        },
        employees_by_department,
        applications_by_role,
        department_options: std::iter::once(ALL.to_string())
            .chain(department_options)
            .collect(),
        role_options: std::iter::once(ALL)
            .chain(all_roles)
            .map(str::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::normalize;
    use serde_json::json;

    fn sample() -> (Vec<Employee>, Vec<JobApplication>, Vec<Department>) {
        let employees = [
            ("Engineering", "Backend Developer"),
            ("Engineering", "Frontend Developer"),
            ("QA", "Tester"),
            ("Sales", "Sales Executive"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (dept, role))| normalize::employee(&json!({ "id": i + 1, "department": dept, "role": role }), i))
        .collect();
        let applications = ["Tester", "QA Tester", "Backend Developer"]
            .iter()
            .enumerate()
            .map(|(i, role)| normalize::application(&json!({ "id": i + 1, "role": role }), i))
            .collect();
        let departments = ["Sales", "Engineering", "QA"]
            .iter()
            .enumerate()
            .map(|(i, name)| normalize::department(&json!({ "id": i + 1, "name": name }), i))
            .collect();
        (employees, applications, departments)
    }

    #[test]
    fn test_unfiltered_summary() {
        let (employees, applications, departments) = sample();
        let summary = summarize(&employees, &applications, &departments, &DashboardFilter::default());
        assert_eq!(
            summary.totals,
            Totals { employees: 4, applicants: 3, departments: 3, roles: 4 }
        );
        assert_eq!(summary.employees_by_department["Engineering"], 2);
        assert_eq!(summary.applications_by_role["Tester"], 2);
        assert_eq!(summary.department_options, vec!["all", "Engineering", "QA", "Sales"]);
        assert_eq!(summary.role_options[0], "all");
        assert_eq!(summary.role_options.len(), 5);
    }

    #[test]
    fn test_role_filter_applies_to_both_lists() {
        let (employees, applications, departments) = sample();
        let filter = DashboardFilter {
            department: Some("all".into()),
            role: Some("Tester".into()),
        };
        let summary = summarize(&employees, &applications, &departments, &filter);
        assert_eq!(summary.totals.employees, 1);
        assert_eq!(summary.totals.applicants, 2);
        assert_eq!(summary.totals.departments, 1);
    }

    #[test]
    fn test_department_filter_ignores_applications() {
        let (employees, applications, departments) = sample();
        let filter = DashboardFilter {
            department: Some("Engineering".into()),
            role: None,
        };
        let summary = summarize(&employees, &applications, &departments, &filter);
        assert_eq!(summary.totals.employees, 2);
        assert_eq!(summary.totals.applicants, 3);
        assert_eq!(summary.totals.roles, 2);
    }
}
