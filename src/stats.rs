// Dashboard counters over the student list

use crate::entities::{Student, StudentStatus};
use crate::program::{classify, Program, ScheduleGroup};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupCounts {
    pub semaine: usize,
    pub weekend: usize,
    pub total: usize,
}

impl GroupCounts {
    fn add(&mut self, group: Option<ScheduleGroup>) {
        self.total += 1;
        match group {
            Some(ScheduleGroup::Semaine) => self.semaine += 1,
            Some(ScheduleGroup::Weekend) => self.weekend += 1,
            None => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total: usize,
    pub active: usize,
    pub archived: usize,
    pub by_group: GroupCounts,
    pub maquillage: GroupCounts,
    pub cosmetologie: GroupCounts,
    pub decoration: GroupCounts,
    /// Students whose program matches no category
    pub unclassified: usize,
}

impl AdminStats {
    pub fn compute(students: &[Student]) -> Self {
        let mut stats = AdminStats::default();

        for student in students {
            stats.total += 1;
            match student.status {
                StudentStatus::Active => stats.active += 1,
                StudentStatus::Archived => stats.archived += 1,
            }

            stats.by_group.add(student.group);

            match classify(student.program_label()) {
                Some(Program::Maquillage) => stats.maquillage.add(student.group),
                Some(Program::Cosmetologie) => stats.cosmetologie.add(student.group),
                Some(Program::Decoration) => stats.decoration.add(student.group),
                None => stats.unclassified += 1,
            }
        }

        stats
    }

    pub fn for_program(&self, program: Program) -> GroupCounts {
        match program {
            Program::Maquillage => self.maquillage,
            Program::Cosmetologie => self.cosmetologie,
            Program::Decoration => self.decoration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(
        program: Option<&str>,
        group: Option<ScheduleGroup>,
        status: StudentStatus,
    ) -> Student {
        let mut s = Student::new("x");
        s.program = program.map(str::to_string);
        s.group = group;
        s.status = status;
        s
    }

    #[test]
    fn test_counts() {
        let mut via_specialty = student(None, Some(ScheduleGroup::Weekend), StudentStatus::Active);
        via_specialty.specialties = vec!["decoration".to_string()];

        let students = vec![
            student(Some("maquillage"), Some(ScheduleGroup::Semaine), StudentStatus::Active),
            student(Some("Maquillage"), Some(ScheduleGroup::Weekend), StudentStatus::Archived),
            student(Some("cosmetologie"), None, StudentStatus::Active),
            student(Some("style-crochet"), Some(ScheduleGroup::Semaine), StudentStatus::Active),
            via_specialty,
        ];

        let stats = AdminStats::compute(&students);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.active, 4);
        assert_eq!(stats.archived, 1);
        assert_eq!(stats.by_group.semaine, 2);
        assert_eq!(stats.by_group.weekend, 2);
        assert_eq!(stats.maquillage, GroupCounts { semaine: 1, weekend: 1, total: 2 });
        assert_eq!(stats.for_program(Program::Cosmetologie).total, 1);
        assert_eq!(stats.for_program(Program::Decoration).weekend, 1);
        assert_eq!(stats.unclassified, 1);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(AdminStats::compute(&[]), AdminStats::default());
    }
}
